//! Render command implementation
//!
//! Prints generated configuration text without touching any file.

use std::path::Path;

use pbx_core::{EntityRef, EntityStore};
use pbx_core::generate::render_dialplan;

use super::open;
use crate::cli::RenderTarget;
use crate::error::{CliError, Result};

/// Run the render command
pub fn run_render(config: &Path, what: &RenderTarget) -> Result<()> {
    let (_, engine) = open(config)?;

    let text = match what {
        RenderTarget::Extension { number } => {
            engine.generate(&EntityRef::Extension(number.clone()))?
        }
        RenderTarget::Trunk { name } => engine.generate(&EntityRef::Trunk(name.clone()))?,
        RenderTarget::Dialplan {
            context: Some(context),
        } => engine.generate(&EntityRef::Dialplan(context.clone()))?,
        RenderTarget::Dialplan { context: None } => {
            let rendered = render_dialplan(&engine.store().rules()?);
            if rendered.is_empty() {
                return Err(CliError::user("no dialplan rules in the database"));
            }
            rendered
                .into_iter()
                .map(|(_, text)| text)
                .collect::<Vec<_>>()
                .join("\n")
        }
    };

    print!("{}", text);
    Ok(())
}
