//! Context command - print the full render context for a dry run

use super::{ModuleArgs, build_context, print_output};
use crate::error::Result;

pub fn run(args: &ModuleArgs) -> Result<()> {
    let Some(context) = build_context(args)? else {
        return Ok(());
    };

    print_output(&context, args.output)
}
