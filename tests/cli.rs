use assert_cmd::prelude::*;
use mockito::{Matcher, Mock, ServerGuard};
use predicates::prelude::*;
use std::process::Command;
use tempfile::{TempDir, tempdir};

/// Command with an isolated config file and database
fn fipesync(temp: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fipesync"));
    cmd.arg("--config")
        .arg(temp.path().join("config.yaml"))
        .arg("--db")
        .arg(temp.path().join("fipe.db"))
        .env_remove("FIPESYNC_API_URL")
        .env_remove("FIPESYNC_FORMAT")
        .env_remove("FIPESYNC_NO_CACHE")
        .env_remove("RUST_LOG");
    cmd
}

/// One brand, one model, one priced model-year
fn mock_catalog(server: &mut ServerGuard) -> Vec<Mock> {
    vec![
        server
            .mock("GET", "/carros/marcas")
            .with_status(200)
            .with_body(r#"[{"codigo":"59","nome":"VW - VolksWagen"},{"codigo":"21","nome":"Fiat"}]"#)
            .expect(1)
            .create(),
        server
            .mock("GET", "/carros/marcas/59/modelos")
            .with_status(200)
            .with_body(r#"{"modelos":[{"codigo":5940,"nome":"Golf"}],"anos":[{"codigo":"2020-1","nome":"2020 Gasolina"}]}"#)
            .create(),
        server
            .mock("GET", "/carros/marcas/21/modelos")
            .with_status(500)
            .with_body("upstream exploded")
            .create(),
        server
            .mock("GET", "/carros/marcas/59/modelos/5940/anos")
            .with_status(200)
            .with_body(r#"[{"codigo":"2020-1","nome":"2020 Gasolina"}]"#)
            .create(),
        server
            .mock("GET", "/carros/marcas/59/modelos/5940/anos/2020-1")
            .with_status(200)
            .with_body(
                r#"{
                    "TipoVeiculo": 1,
                    "Valor": "R$ 85.000,00",
                    "Marca": "VW - VolksWagen",
                    "Modelo": "Golf",
                    "AnoModelo": 2020,
                    "Combustivel": "Gasolina",
                    "CodigoFipe": "005340-6",
                    "MesReferencia": "julho de 2024 ",
                    "SiglaCombustivel": "G"
                }"#,
            )
            .create(),
    ]
}

fn json_stdout(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn years_on_empty_cache_prints_no_results() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;

    fipesync(&temp)
        .arg("years")
        .assert()
        .success()
        .stdout(predicate::str::contains("No results found."));

    Ok(())
}

#[test]
fn missing_value_fails_with_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;

    fipesync(&temp)
        .args(["value", "--year", "2020-1", "--brand", "59", "--model", "5940"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Error: Not found"));

    Ok(())
}

#[test]
fn update_then_lookup_chain() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let mocks = mock_catalog(&mut server);
    let temp = tempdir()?;

    fipesync(&temp)
        .arg("--api-url")
        .arg(server.url())
        .arg("update")
        .assert()
        .success()
        .stdout(predicate::str::contains("FIPE cache refreshed"))
        .stdout(predicate::str::contains("Values:   1"));

    fipesync(&temp)
        .arg("years")
        .assert()
        .success()
        .stdout(predicate::str::contains("2020 Gasolina"));

    fipesync(&temp)
        .args(["brands", "--year", "2020 Gasolina"])
        .assert()
        .success()
        .stdout(predicate::str::contains("VW - VolksWagen"))
        .stdout(predicate::str::contains("Fiat").not());

    fipesync(&temp)
        .args(["models", "--year", "2020-1", "--brand", "59"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Golf"));

    fipesync(&temp)
        .args(["value", "--year", "2020 Gasolina", "-b", "59", "-m", "5940"])
        .assert()
        .success()
        .stdout(predicate::str::contains("R$ 85.000,00"))
        .stdout(predicate::str::contains("julho de 2024"));

    let output = fipesync(&temp)
        .args(["--format", "json", "value", "--year", "2020-1", "-b", "59", "-m", "5940"])
        .output()?;
    assert!(output.status.success());
    let json = json_stdout(&output);
    assert_eq!(json["data"]["price"], 85000.0);
    assert_eq!(json["data"]["reference_month"], "julho de 2024");
    assert_eq!(json["meta"]["version"], env!("CARGO_PKG_VERSION"));

    let output = fipesync(&temp).args(["--format", "json", "stats"]).output()?;
    let json = json_stdout(&output);
    assert_eq!(json["data"]["brands"], 2);
    assert_eq!(json["data"]["models"], 1);
    assert_eq!(json["data"]["values"], 1);
    assert!(json["data"]["last_update"].is_string());

    let output = fipesync(&temp).args(["--format", "json", "status"]).output()?;
    let json = json_stdout(&output);
    assert_eq!(json["data"]["needs_update"], false);
    assert_eq!(json["data"]["latest_run"]["status"], "completed");
    assert_eq!(json["data"]["latest_run"]["stats"]["models"], 1);

    for mock in &mocks {
        mock.assert();
    }
    Ok(())
}

#[test]
fn update_if_stale_skips_fresh_cache() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let mocks = mock_catalog(&mut server);
    let temp = tempdir()?;

    fipesync(&temp)
        .arg("--api-url")
        .arg(server.url())
        .args(["update", "--if-stale"])
        .assert()
        .success();

    fipesync(&temp)
        .arg("--api-url")
        .arg(server.url())
        .args(["update", "--if-stale"])
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));

    // Brand list fetched by the first run only
    mocks[0].assert();
    Ok(())
}

#[test]
fn failed_update_is_recorded() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let _brands = server
        .mock("GET", "/carros/marcas")
        .with_status(503)
        .with_body("maintenance")
        .create();
    let temp = tempdir()?;

    fipesync(&temp)
        .arg("--api-url")
        .arg(server.url())
        .arg("update")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));

    let output = fipesync(&temp)
        .args(["--format", "json", "history"])
        .output()?;
    let json = json_stdout(&output);
    assert_eq!(json["data"][0]["status"], "error");
    assert!(
        json["data"][0]["error"]
            .as_str()
            .unwrap_or_default()
            .contains("Server error")
    );

    Ok(())
}

#[test]
fn clear_wipes_cached_data() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let _mocks = mock_catalog(&mut server);
    let temp = tempdir()?;

    fipesync(&temp)
        .arg("--api-url")
        .arg(server.url())
        .arg("update")
        .assert()
        .success();

    fipesync(&temp)
        .args(["clear", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 2 brands"));

    fipesync(&temp)
        .arg("years")
        .assert()
        .success()
        .stdout(predicate::str::contains("No results found."));

    Ok(())
}

#[test]
fn live_brands_queries_upstream() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let brands = server
        .mock("GET", "/motos/marcas")
        .match_header("user-agent", Matcher::Regex("^fipesync/".to_string()))
        .with_status(200)
        .with_body(r#"[{"codigo":"77","nome":"Honda"}]"#)
        .create();
    let temp = tempdir()?;
    std::fs::write(temp.path().join("config.yaml"), "vehicle_kind: motos\n")?;

    fipesync(&temp)
        .arg("--api-url")
        .arg(server.url())
        .args(["--no-cache", "live", "brands"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Honda"))
        .stdout(predicate::str::contains("77"));

    brands.assert();
    Ok(())
}

#[test]
fn live_value_not_found_upstream() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let _value = server
        .mock("GET", "/carros/marcas/59/modelos/5940/anos/1999-1")
        .with_status(404)
        .create();
    let temp = tempdir()?;

    fipesync(&temp)
        .arg("--api-url")
        .arg(server.url())
        .args(["--no-cache", "live", "value", "59", "5940", "1999-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    Ok(())
}

#[test]
fn invalid_config_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    std::fs::write(temp.path().join("config.yaml"), "refresh_interval_hours: 0\n")?;

    fipesync(&temp)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("refresh_interval_hours"));

    Ok(())
}

#[test]
fn out_of_range_config_fails_cleanly() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    std::fs::write(
        temp.path().join("config.yaml"),
        "refresh_interval_hours: 18446744073709551615\n",
    )?;

    fipesync(&temp)
        .arg("status")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("refresh_interval_hours must be between"));

    std::fs::write(temp.path().join("config.yaml"), "request_timeout_secs: 0\n")?;

    fipesync(&temp)
        .args(["--no-cache", "live", "brands"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("request_timeout_secs"));

    Ok(())
}

#[test]
fn completion_generates_script() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;

    fipesync(&temp)
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fipesync"));

    Ok(())
}
