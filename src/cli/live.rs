//! Live lookups against the FIPE API

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, LiveCommands};
use crate::client::FipeApi;
use crate::error::Result;
use crate::models::ReferenceDisplay;
use crate::models::display::upstream_value_fields;
use crate::output::{Formattable, print_record};

pub async fn run(opts: &GlobalOptions, cmd: &LiveCommands) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let client = ctx.live_client()?;

    let refs = match cmd {
        LiveCommands::Brands => client.list_brands().await?,
        LiveCommands::Models { brand } => client.list_models(brand).await?,
        LiveCommands::Years { brand, model } => client.list_years(brand, model).await?,
        LiveCommands::Value { brand, model, year } => {
            let value = client.get_value(brand, model, year).await?;
            return print_record(&value, upstream_value_fields(&value), ctx.format);
        }
    };

    let display: Vec<ReferenceDisplay> = refs.into_iter().map(ReferenceDisplay::from).collect();
    display.print(ctx.format)
}
