//! Restore command - restore every detected cache before the build

use crate::cache::{
    ContentHasher, Ecosystem, GlobResolver, InputPlan, KeyBuilder, KeyComponents, KeyContext,
    MatrixSignature, RestoreCoordinator, RestoreOutcome,
};
use crate::cli::args::RestoreArgs;
use crate::config::schema::KeyConfig;
use crate::config::Config;
use crate::error::CacheResult;
use crate::host::{create_host, OutputSink, StateStore};
use crate::probe::OsProbe;
use crate::store::{create_store, BlobStore};
use std::env;
use tracing::{debug, info};

/// Environment variable pointing Coursier at its cache
const COURSIER_CACHE_VAR: &str = "COURSIER_CACHE";

/// Execute the restore command
pub async fn execute(args: RestoreArgs, config: &Config) -> CacheResult<()> {
    let mut config = config.clone();
    args.apply(&mut config)?;

    let host = create_host(&config)?;
    let store = create_store(&config);
    debug!("Using {} store", store.store_name());

    let outcomes = restore_all(&config, &*store, &*host, &OsProbe::new()).await?;
    let hits = outcomes.iter().filter(|(_, o)| o.is_exact_hit()).count();
    info!("{} of {} cache(s) hit their primary key", hits, outcomes.len());
    Ok(())
}

/// Restore every detected ecosystem in order, Coursier first
pub async fn restore_all<H>(
    config: &Config,
    store: &dyn BlobStore,
    host: &H,
    probe: &OsProbe,
) -> CacheResult<Vec<(Ecosystem, RestoreOutcome)>>
where
    H: StateStore + OutputSink + ?Sized,
{
    let resolver = GlobResolver::new(&config.general.root);
    let plan = InputPlan::discover(&resolver, config)?;
    let context = key_context(&config.key);
    let builder = KeyBuilder::new(ContentHasher::new());
    let coordinator = RestoreCoordinator::new(store, host);

    let mut outcomes = Vec::new();
    for inputs in plan.entries() {
        if !inputs.detected {
            debug!("No {} build files found, skipping", inputs.ecosystem);
            continue;
        }

        let eco_config = config.ecosystem(inputs.ecosystem);
        let paths = cache_paths(inputs.ecosystem, config, probe, host).await?;
        let key = builder.build(&KeyComponents {
            ecosystem_id: inputs.ecosystem.id(),
            context: &context,
            extra_key: eco_config.extra_key.as_deref(),
            input_files: &inputs.files,
            extra_hashed_content: &inputs.extra_hashed_content,
        })?;

        let outcome = coordinator.restore(inputs.ecosystem.id(), &paths, &key).await?;
        outcomes.push((inputs.ecosystem, outcome));
    }
    Ok(outcomes)
}

/// Run-wide key segments, with the job falling back to `$GITHUB_JOB`
pub fn key_context(key: &KeyConfig) -> KeyContext {
    let job = if key.ignore_job {
        None
    } else {
        key.job
            .clone()
            .or_else(|| env::var("GITHUB_JOB").ok())
            .filter(|j| !j.is_empty())
    };
    let matrix = if key.ignore_matrix {
        MatrixSignature::NotProvided
    } else {
        MatrixSignature::parse(key.matrix.as_deref())
    };

    KeyContext {
        job,
        matrix,
        shared_extra_key: key.extra_key.clone().filter(|k| !k.is_empty()),
    }
}

/// Storage paths of one ecosystem: configured paths win over defaults
async fn cache_paths<H>(
    ecosystem: Ecosystem,
    config: &Config,
    probe: &OsProbe,
    host: &H,
) -> CacheResult<Vec<String>>
where
    H: OutputSink + ?Sized,
{
    let configured = &config.ecosystem(ecosystem).paths;
    if !configured.is_empty() {
        if let (Ecosystem::Coursier, [path]) = (ecosystem, configured.as_slice()) {
            host.export_variable(COURSIER_CACHE_VAR, path)?;
        }
        return Ok(configured.clone());
    }

    match ecosystem {
        Ecosystem::Coursier => Ok(vec![probe.os().await.coursier_cache_path().to_string()]),
        other => Ok(other.default_paths().iter().map(|p| p.to_string()).collect()),
    }
}
