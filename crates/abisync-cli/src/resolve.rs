//! Deployment trace resolution
//!
//! Turns forge broadcast output into publishable ABI records:
//!
//! ```text
//! locate -> parse -> detect proxies -> build candidates -> filter -> resolve ABI -> emit
//! ```
//!
//! Scripts are processed in configured order, trace files in discovery order
//! and candidates one at a time, so diagnostics stay interleaved and
//! deterministic.

use std::collections::HashSet;
use std::sync::Arc;

use abisync_core::{
    Abi, ChainId, ContractSelector, ProxyDetector, ProxyMapping, ProxySpec, PublishRecord,
    Result, Trace,
};
use color_eyre::eyre;
use tracing::{debug, info, warn};

use crate::config::{ForgeSettings, ScriptConfig};
use crate::forge::{
    ArtifactLoader, FileSystemArtifactLoader, ForgeTraceParser, TraceFile, TraceLocator,
    TraceParser,
};

// =============================================================================
// Types
// =============================================================================

/// A deployment that may be published
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub address: String,
    /// When set, the ABI comes from the implementation (and facets), not
    /// from the candidate's own artifact
    pub proxy: Option<ProxySpec>,
}

impl Candidate {
    fn new(name: &str, address: &str, proxy: Option<ProxySpec>) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
            proxy,
        }
    }
}

/// Result of a full resolution run
#[derive(Debug)]
pub enum Resolution {
    Ready(Vec<PublishRecord>),
    /// Every script was skipped or filtered down to nothing
    NothingToPublish,
}

/// Proxy mappings and filtered candidates for one trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracePlan {
    pub mappings: Vec<ProxyMapping>,
    pub candidates: Vec<Candidate>,
}

/// What the read-only scan found for one trace file
#[derive(Debug)]
pub enum TraceInspection {
    Planned { chain_id: ChainId, plan: TracePlan },
    Excluded(ChainId),
    /// The file could not be parsed; scanning continues
    Unreadable(abisync_core::Error),
}

#[derive(Debug)]
pub struct TraceReport {
    pub file: TraceFile,
    pub inspection: TraceInspection,
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves deployment traces into publish records
#[derive(Clone)]
pub struct Resolver {
    locator: TraceLocator,
    parser: Arc<dyn TraceParser>,
    artifacts: Arc<dyn ArtifactLoader>,
    detector: ProxyDetector,
    label: Option<String>,
}

impl Resolver {
    pub fn new(
        locator: TraceLocator,
        parser: Arc<dyn TraceParser>,
        artifacts: Arc<dyn ArtifactLoader>,
        detector: ProxyDetector,
    ) -> Self {
        Self {
            locator,
            parser,
            artifacts,
            detector,
            label: None,
        }
    }

    /// Build a filesystem-backed resolver from `[forge]` settings
    pub fn from_settings(settings: &ForgeSettings) -> eyre::Result<Self> {
        let paths = settings.paths()?;

        let locator = TraceLocator::new(paths.broadcast_dir)
            .with_file_name(settings.trace_file.clone())
            .excluding(settings.excluded_chains());

        Ok(Self::new(
            locator,
            Arc::new(ForgeTraceParser::new()),
            Arc::new(FileSystemArtifactLoader::with_out_dir(paths.out_dir)),
            ProxyDetector::with_threshold(settings.proxy_init_code_max_bytes),
        ))
    }

    /// Attach a free-text label to every emitted record
    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    /// Resolve every script in order.
    ///
    /// Any parse or artifact failure aborts the run. Zero records overall is
    /// reported as [`Resolution::NothingToPublish`].
    pub fn resolve(&self, scripts: &[ScriptConfig]) -> Result<Resolution> {
        let mut records = Vec::new();

        for script in scripts {
            records.extend(self.resolve_script(script)?);
        }

        if records.is_empty() {
            return Ok(Resolution::NothingToPublish);
        }
        Ok(Resolution::Ready(records))
    }

    /// Resolve all trace files of one script, concatenating their records
    pub fn resolve_script(&self, script: &ScriptConfig) -> Result<Vec<PublishRecord>> {
        let files = self.locator.locate(&script.name)?;

        if files.is_empty() {
            warn!(script = %script.name, "no trace files found, skipping script");
            return Ok(Vec::new());
        }

        let selectors = script.selectors();
        let mut records = Vec::new();

        for file in &files {
            info!(script = %script.name, path = %file.path.display(), "processing trace");
            let trace = self.parser.parse(&file.path)?;

            if let Some(dir_chain) = file.chain_dir.filter(|id| *id != trace.chain_id) {
                warn!(
                    path = %file.path.display(),
                    folder_chain_id = %dir_chain,
                    chain_id = %trace.chain_id,
                    "trace chain does not match its folder, using the trace"
                );
            }

            if self.locator.is_excluded(trace.chain_id) {
                info!(script = %script.name, chain_id = %trace.chain_id, "skipping excluded chain");
                continue;
            }

            records.extend(self.resolve_trace(&script.name, &trace, &selectors)?);
        }

        Ok(records)
    }

    /// Detect proxies and build the filtered candidate list for a trace
    pub fn plan_trace(&self, trace: &Trace, selectors: &[ContractSelector]) -> TracePlan {
        let mappings = self.detector.detect(&trace.transactions);
        let candidates = filter_candidates(build_candidates(trace, &mappings, selectors), selectors);
        TracePlan {
            mappings,
            candidates,
        }
    }

    /// Resolve one parsed trace into records
    pub fn resolve_trace(
        &self,
        script: &str,
        trace: &Trace,
        selectors: &[ContractSelector],
    ) -> Result<Vec<PublishRecord>> {
        let plan = self.plan_trace(trace, selectors);

        if plan.candidates.is_empty() {
            if selectors.is_empty() {
                debug!(script, chain_id = %trace.chain_id, "no named deployments in trace");
            } else {
                let names: Vec<&str> = selectors.iter().map(|s| s.name.as_str()).collect();
                warn!(
                    script,
                    chain_id = %trace.chain_id,
                    allow_list = ?names,
                    "no deployments match the configured contracts"
                );
            }
            return Ok(Vec::new());
        }

        let deployed_at = trace.deployed_at();

        plan.candidates
            .iter()
            .map(|candidate| {
                let abi = self.resolve_abi(candidate)?;
                debug!(
                    contract = %candidate.name,
                    address = %candidate.address,
                    entries = abi.len(),
                    "resolved ABI"
                );
                Ok(PublishRecord::new(
                    candidate.name.clone(),
                    candidate.address.clone(),
                    trace.chain_id,
                    self.label.clone(),
                    deployed_at,
                    abi,
                ))
            })
            .collect()
    }

    /// Load a candidate's ABI, following its proxy spec when present
    pub fn resolve_abi(&self, candidate: &Candidate) -> Result<Abi> {
        match &candidate.proxy {
            Some(spec) => self
                .artifacts
                .load_merged(&spec.implementation, &spec.interfaces),
            None => self.artifacts.load_abi(&candidate.name),
        }
    }

    /// Read-only view of what a script would publish.
    ///
    /// Unlike [`Resolver::resolve_script`], unreadable trace files are
    /// reported and skipped instead of aborting. No artifacts are loaded.
    pub fn inspect_script(&self, script: &ScriptConfig) -> Result<Vec<TraceReport>> {
        let selectors = script.selectors();

        let reports = self
            .locator
            .locate(&script.name)?
            .into_iter()
            .map(|file| {
                let inspection = match self.parser.parse(&file.path) {
                    Ok(trace) if self.locator.is_excluded(trace.chain_id) => {
                        TraceInspection::Excluded(trace.chain_id)
                    }
                    Ok(trace) => TraceInspection::Planned {
                        chain_id: trace.chain_id,
                        plan: self.plan_trace(&trace, &selectors),
                    },
                    Err(e) => {
                        warn!(path = %file.path.display(), error = %e, "skipping unreadable trace");
                        TraceInspection::Unreadable(e)
                    }
                };
                TraceReport { file, inspection }
            })
            .collect();

        Ok(reports)
    }
}

// =============================================================================
// Candidate Selection
// =============================================================================

/// Build publishable candidates from a trace and its detected proxies.
///
/// Named CREATEs become candidates, except implementations fronted by a
/// detected proxy: those are replaced by one `<Implementation>Proxy`
/// candidate at the most recently deployed proxy address. A selector with an
/// explicit `proxy` spec overrides how that name's ABI is resolved.
pub fn build_candidates(
    trace: &Trace,
    mappings: &[ProxyMapping],
    selectors: &[ContractSelector],
) -> Vec<Candidate> {
    let explicit_proxy = |name: &str| {
        selectors
            .iter()
            .find(|selector| selector.name == name)
            .and_then(|selector| selector.proxy.clone())
    };

    let implementations: HashSet<&str> = mappings
        .iter()
        .map(|m| m.implementation_name.as_str())
        .collect();

    let mut candidates: Vec<Candidate> = trace
        .transactions
        .iter()
        .filter_map(|tx| tx.named_deployment())
        .filter(|(name, _)| !implementations.contains(name))
        .map(|(name, address)| Candidate::new(name, address, explicit_proxy(name)))
        .collect();

    // implementation -> latest proxy address, in order of first detection
    let mut proxies: Vec<(&str, &str)> = Vec::new();
    for mapping in mappings {
        let implementation = mapping.implementation_name.as_str();
        match proxies.iter_mut().find(|(name, _)| *name == implementation) {
            Some(entry) => {
                debug!(
                    implementation,
                    superseded = entry.1,
                    proxy = %mapping.proxy_address,
                    "implementation has several proxies, keeping the latest"
                );
                entry.1 = mapping.proxy_address.as_str();
            }
            None => proxies.push((implementation, mapping.proxy_address.as_str())),
        }
    }

    for (implementation, address) in proxies {
        let name = format!("{}Proxy", implementation);
        let spec = explicit_proxy(&name).unwrap_or_else(|| ProxySpec::new(implementation));
        candidates.push(Candidate::new(&name, address, Some(spec)));
    }

    candidates
}

/// Keep only candidates named by `selectors`. An empty selector list keeps
/// everything.
pub fn filter_candidates(candidates: Vec<Candidate>, selectors: &[ContractSelector]) -> Vec<Candidate> {
    if selectors.is_empty() {
        return candidates;
    }

    let allowed: HashSet<&str> = selectors.iter().map(|s| s.name.as_str()).collect();
    candidates
        .into_iter()
        .filter(|candidate| allowed.contains(candidate.name.as_str()))
        .collect()
}
