//! Merge script: combine the cleaned event files into one observation.
use crate::cli::StepArgs;
use crate::script::{quote_path, ScriptFile};
use anyhow::Result;

pub fn run(args: &StepArgs) -> Result<()> {
    let (store, config) = super::load(&args.root)?;
    let reppro_dir = store.resolve(&config.info.reppro_dir);
    let merge_dir = store.resolve(&config.info.merge_dir);

    let mut script = ScriptFile::new("merge_data.sh");
    script.line(format!("cd {}", quote_path(&reppro_dir)));
    script.line("pwd");
    script.line("find \"$PWD\" -type f -name \"acisf*clean*\" >clean_evt.list");
    script.line("punlearn merge_obs");
    script.line(format!(
        "merge_obs @clean_evt.list {}/ bin=1 bands=broad clobber=yes",
        quote_path(&merge_dir)
    ));
    script.line(format!(
        "echo \"Merged data for {}\"",
        config.info.name
    ));
    script.mark_complete(store.root(), "merge_data");

    let path = script.write_to(&store.resolve(&config.info.script_dir))?;
    println!("wrote {}", path.display());
    Ok(())
}
