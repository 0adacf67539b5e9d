//! Reprocessing script: rerun the standard pipeline per observation.
use crate::cli::StepArgs;
use crate::probe;
use crate::script::{quote_path, ScriptFile};
use anyhow::Result;

pub fn run(args: &StepArgs) -> Result<()> {
    let (store, config) = super::load(&args.root)?;
    let cluster_dir = store.resolve(&config.info.cluster_directory);
    let reppro_dir = store.resolve(&config.info.reppro_dir);

    let mut script = ScriptFile::new("reprocess.sh");
    for obs_id in &config.info.obs_ids {
        let mode = probe::observation_mode(&store, &config, obs_id);
        if let Some(reason) = mode.fallback_reason() {
            tracing::debug!(%obs_id, ?reason, "observation mode defaulted");
        }
        // VFAINT observations get the stricter background cleaning.
        let check_vf_pha = if mode.value().is_vfaint() { "yes" } else { "no" };
        script.line(format!("echo \"Reprocessing {obs_id}\""));
        script.line("punlearn chandra_repro");
        script.line(format!(
            "chandra_repro indir={} outdir={} check_vf_pha={check_vf_pha} cleanup=yes clobber=yes",
            quote_path(&cluster_dir.join(obs_id)),
            quote_path(&reppro_dir.join(obs_id)),
        ));
        script.divider();
    }
    script.mark_complete(store.root(), "reprocessed");

    let path = script.write_to(&store.resolve(&config.info.script_dir))?;
    println!("wrote {}", path.display());
    Ok(())
}
