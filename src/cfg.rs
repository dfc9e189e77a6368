use crate::error::Error;
use crate::filter::{join_filters, Filter};

/// Which filter list a filter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    Cpu,
    Gpu,
    Net,
}

impl Subsystem {
    pub const ALL: [Subsystem; 3] = [Subsystem::Cpu, Subsystem::Gpu, Subsystem::Net];
}

impl std::fmt::Display for Subsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Subsystem::*;
        match self {
            Cpu => write!(f, "cpu"),
            Gpu => write!(f, "gpu"),
            Net => write!(f, "net"),
        }
    }
}

/// Settings for one profiling run.
///
/// Every field has a default, so the usual flow is to start from
/// [`SofaConfig::default()`] and overwrite what the run needs:
///
/// ```
/// use sofa::{Filter, SofaConfig};
///
/// let mut cfg = SofaConfig {
///     viz_port: 9001,
///     enable_vmstat: true,
///     ..SofaConfig::default()
/// };
/// cfg.cpu_filters.push(Filter::new("idle", "black"));
/// assert_eq!(cfg.num_iterations, 20);
/// assert_eq!(cfg.cpu_filters.len(), 1);
/// ```
///
/// Nothing here is validated. Checking that `perf_events` names real
/// counters, or that `script_path` exists, is up to whatever consumes the
/// config.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SofaConfig {
    pub cpu_filters: Vec<Filter>,
    pub gpu_filters: Vec<Filter>,
    pub net_filters: Vec<Filter>,
    /// Comma-joined hardware counter names, e.g. `cycles,instructions`
    pub perf_events: String,
    pub verbose: bool,
    pub num_iterations: u32,
    /// Number of parallel measurement groups
    pub num_swarms: u32,
    /// How many of the hottest CPU entries to report
    pub cpu_top_k: u32,
    pub plot_ratio: f64,
    /// Port the visualization server listens on
    pub viz_port: u16,
    /// Added to CPU timestamps to line them up with other sources
    pub cpu_time_offset: f64,
    pub profile_all_cpus: bool,
    pub enable_aisi: bool,
    pub enable_hsg: bool,
    pub enable_vmstat: bool,
    pub enable_pcm: bool,
    pub cuda_api_tracing: bool,
    pub script_path: String,
}

impl Default for SofaConfig {
    fn default() -> Self {
        Self {
            cpu_filters: Vec::new(),
            gpu_filters: Vec::new(),
            net_filters: Vec::new(),
            perf_events: "cycles,instructions".to_string(),
            verbose: false,
            num_iterations: 20,
            num_swarms: 20,
            cpu_top_k: 20,
            plot_ratio: 1.0,
            viz_port: 8000,
            cpu_time_offset: 0.0,
            profile_all_cpus: false,
            enable_aisi: false,
            enable_hsg: false,
            enable_vmstat: false,
            enable_pcm: false,
            cuda_api_tracing: false,
            script_path: String::new(),
        }
    }
}

impl SofaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filters(&self, subsystem: Subsystem) -> &[Filter] {
        use Subsystem::*;
        match subsystem {
            Cpu => &self.cpu_filters,
            Gpu => &self.gpu_filters,
            Net => &self.net_filters,
        }
    }

    pub fn filters_mut(&mut self, subsystem: Subsystem) -> &mut Vec<Filter> {
        use Subsystem::*;
        match subsystem {
            Cpu => &mut self.cpu_filters,
            Gpu => &mut self.gpu_filters,
            Net => &mut self.net_filters,
        }
    }

    /// Event names in `perf_events`, trimmed, empty names skipped.
    pub fn perf_event_list(&self) -> impl Iterator<Item = &str> {
        self.perf_events
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    /// Every field as `(name, value)`, in declaration order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("cpu_filters", join_filters(&self.cpu_filters)),
            ("gpu_filters", join_filters(&self.gpu_filters)),
            ("net_filters", join_filters(&self.net_filters)),
            ("perf_events", self.perf_events.clone()),
            ("verbose", self.verbose.to_string()),
            ("num_iterations", self.num_iterations.to_string()),
            ("num_swarms", self.num_swarms.to_string()),
            ("cpu_top_k", self.cpu_top_k.to_string()),
            ("plot_ratio", self.plot_ratio.to_string()),
            ("viz_port", self.viz_port.to_string()),
            ("cpu_time_offset", self.cpu_time_offset.to_string()),
            ("profile_all_cpus", self.profile_all_cpus.to_string()),
            ("enable_aisi", self.enable_aisi.to_string()),
            ("enable_hsg", self.enable_hsg.to_string()),
            ("enable_vmstat", self.enable_vmstat.to_string()),
            ("enable_pcm", self.enable_pcm.to_string()),
            ("cuda_api_tracing", self.cuda_api_tracing.to_string()),
            ("script_path", self.script_path.clone()),
        ]
    }

    /// Parse a TOML document. Missing keys keep their defaults, unknown keys
    /// are an error.
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_toml_str(&text)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(cfg)
    }

    pub fn to_toml_string(&self) -> Result<String, Error> {
        Ok(toml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = SofaConfig::new();
        assert_eq!(cfg.perf_events, "cycles,instructions");
        assert!(!cfg.verbose);
        assert_eq!(cfg.num_iterations, 20);
        assert_eq!(cfg.num_swarms, 20);
        assert_eq!(cfg.cpu_top_k, 20);
        assert_eq!(cfg.plot_ratio, 1.0);
        assert_eq!(cfg.viz_port, 8000);
        assert_eq!(cfg.cpu_time_offset, 0.0);
        assert!(!cfg.profile_all_cpus);
        assert!(!cfg.enable_aisi);
        assert!(!cfg.enable_hsg);
        assert!(!cfg.enable_vmstat);
        assert!(!cfg.enable_pcm);
        assert!(!cfg.cuda_api_tracing);
        assert_eq!(cfg.script_path, "");
    }

    #[test]
    fn test_default_filters_empty() {
        let cfg = SofaConfig::default();
        for s in Subsystem::ALL {
            assert!(cfg.filters(s).is_empty(), "{s} filters not empty");
        }
    }

    #[test]
    fn test_push_cpu_filter_only_touches_cpu() {
        let mut cfg = SofaConfig::default();
        cfg.cpu_filters.push(Filter::new("malloc", "red"));
        assert_eq!(cfg.cpu_filters.len(), 1);
        assert!(cfg.gpu_filters.is_empty());
        assert!(cfg.net_filters.is_empty());
    }

    #[test]
    fn test_filters_mut_addresses_subsystem() {
        let mut cfg = SofaConfig::default();
        cfg.filters_mut(Subsystem::Net).push(Filter::new("tcp", "green"));
        assert_eq!(cfg.net_filters, vec![Filter::new("tcp", "green")]);
        assert!(cfg.filters(Subsystem::Cpu).is_empty());
        assert!(cfg.filters(Subsystem::Gpu).is_empty());
    }

    #[test]
    fn test_overwrite_scalar_leaves_rest() {
        let mut cfg = SofaConfig::default();
        cfg.viz_port = 9001;
        assert_eq!(
            cfg,
            SofaConfig {
                viz_port: 9001,
                ..SofaConfig::default()
            }
        );
        assert_ne!(cfg, SofaConfig::default());
    }

    #[test]
    fn test_instances_are_independent() {
        let mut a = SofaConfig::default();
        let b = SofaConfig::default();
        let c = a.clone();
        a.gpu_filters.push(Filter::new("memcpy", "blue"));
        assert!(b.gpu_filters.is_empty());
        assert!(c.gpu_filters.is_empty());
    }

    #[test]
    fn test_perf_event_list() {
        let mut cfg = SofaConfig::default();
        assert_eq!(
            cfg.perf_event_list().collect::<Vec<_>>(),
            vec!["cycles", "instructions"]
        );
        cfg.perf_events = " cycles, ,cache-misses,".to_string();
        assert_eq!(
            cfg.perf_event_list().collect::<Vec<_>>(),
            vec!["cycles", "cache-misses"]
        );
        cfg.perf_events.clear();
        assert_eq!(cfg.perf_event_list().count(), 0);
    }

    #[test]
    fn test_entries() {
        let mut cfg = SofaConfig::default();
        cfg.cpu_filters.push(Filter::new("idle", "black"));
        cfg.cpu_filters.push(Filter::new("lock", "red"));
        let entries = cfg.entries();
        assert_eq!(entries.len(), 18);
        assert_eq!(entries[0], ("cpu_filters", "idle:black,lock:red".to_string()));
        assert_eq!(entries[1], ("gpu_filters", String::new()));
        assert!(entries.contains(&("viz_port", "8000".to_string())));
        assert!(entries.contains(&("plot_ratio", "1".to_string())));
        assert_eq!(entries[17], ("script_path", String::new()));
    }

    #[test]
    fn test_from_toml_empty_is_default() {
        assert_eq!(SofaConfig::from_toml_str("").unwrap(), SofaConfig::default());
    }

    #[test]
    fn test_from_toml_partial() {
        let cfg = SofaConfig::from_toml_str(
            r#"
viz_port = 9001
enable_pcm = true
perf_events = "cycles,cache-misses"

[[gpu_filters]]
keyword = "memcpy"
color = "blue"
"#,
        )
        .unwrap();
        let mut expected = SofaConfig {
            viz_port: 9001,
            enable_pcm: true,
            perf_events: "cycles,cache-misses".to_string(),
            ..SofaConfig::default()
        };
        expected.gpu_filters.push(Filter::new("memcpy", "blue"));
        assert_eq!(cfg, expected);
    }

    #[test]
    fn test_from_toml_rejects_unknown_key() {
        assert!(matches!(
            SofaConfig::from_toml_str("viz_prot = 9001"),
            Err(Error::ParseConfig(_))
        ));
    }

    #[test]
    fn test_from_toml_rejects_out_of_range_port() {
        assert!(SofaConfig::from_toml_str("viz_port = 70000").is_err());
    }

    #[test]
    fn test_toml_string_parses_back() {
        let mut cfg = SofaConfig {
            plot_ratio: 2.5,
            cpu_time_offset: -0.125,
            script_path: "/opt/sofa/run.sh".to_string(),
            cuda_api_tracing: true,
            ..SofaConfig::default()
        };
        cfg.cpu_filters.push(Filter::new("std::vector", "blue"));
        cfg.net_filters.push(Filter::new("tcp", "green"));
        let text = cfg.to_toml_string().unwrap();
        assert_eq!(SofaConfig::from_toml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("sofa-config-test-does-not-exist.toml");
        match SofaConfig::load(&path) {
            Err(Error::Io { path: p, source }) => {
                assert_eq!(p, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir().join(format!("sofa-config-test-{}.toml", std::process::id()));
        std::fs::write(&path, "num_swarms = 4\nverbose = true\n").unwrap();
        let cfg = SofaConfig::load(&path);
        std::fs::remove_file(&path).ok();
        let cfg = cfg.unwrap();
        assert_eq!(cfg.num_swarms, 4);
        assert!(cfg.verbose);
        assert_eq!(cfg.num_iterations, 20);
    }
}
