use crate::output::Output;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use media_prune_config::PathManager;
use media_prune_core::FileStore;

pub fn run_clear(paths: &PathManager, all: bool, catalog: bool, suggestions: bool, output: &Output) -> Result<()> {
    if !(all || catalog || suggestions) {
        output.warn("No clear option specified. Use --catalog, --suggestions or --all");
        output.println("\nExample: reclaim clear --suggestions");
        return Ok(());
    }

    let store = FileStore::new(paths.data_dir())
        .wrap_err_with(|| format!("Failed to open data directory {}", paths.data_dir().display()))?;

    if all || catalog {
        let cleared = store.clear_catalog().wrap_err("Failed to clear catalog")?;
        if cleared {
            output.success("Cleared catalog; the next sync rebuilds it");
        } else {
            output.info("Catalog was already empty");
        }
    }

    if all || suggestions {
        let removed = store.clear_suggestions().wrap_err("Failed to clear suggestions")?;
        if removed {
            output.success(format!("Cleared suggestions: {}", store.suggestions_path().display()));
        } else {
            output.info("No suggestions found to clear");
        }
    }

    Ok(())
}
