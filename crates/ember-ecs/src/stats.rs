//! Registry statistics: entity counts and per-component memory

/// Count and footprint of one component type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentStat {
    /// Short type name, e.g. `Position`
    pub name: String,
    /// Entities carrying the component
    pub count: usize,
    /// `count * size_of::<C>()`
    pub bytes: usize,
}

/// Snapshot of what a registry currently holds
#[derive(Debug, Clone, Default)]
pub struct RegistryStats {
    pub alive_entities: usize,
    pub components: Vec<ComponentStat>,
}

impl RegistryStats {
    pub fn total_components(&self) -> usize {
        self.components.iter().map(|c| c.count).sum()
    }

    pub fn total_bytes(&self) -> usize {
        self.components.iter().map(|c| c.bytes).sum()
    }

    /// Look up a component line by its short name
    pub fn component(&self, name: &str) -> Option<&ComponentStat> {
        self.components.iter().find(|c| c.name == name)
    }
}

/// Human-readable byte count: `1536` -> `"1.5 KB"`
pub fn format_bytes(bytes: usize) -> String {
    const SUFFIXES: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut idx = 0;
    while size >= 1024.0 && idx < SUFFIXES.len() - 1 {
        size /= 1024.0;
        idx += 1;
    }
    format!("{size:.1} {}", SUFFIXES[idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_suffixes() {
        assert_eq!(format_bytes(0), "0.0 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn totals() {
        let stats = RegistryStats {
            alive_entities: 3,
            components: vec![
                ComponentStat { name: "Position".into(), count: 3, bytes: 24 },
                ComponentStat { name: "Color".into(), count: 2, bytes: 8 },
            ],
        };
        assert_eq!(stats.total_components(), 5);
        assert_eq!(stats.total_bytes(), 32);
        assert_eq!(stats.component("Color").map(|c| c.count), Some(2));
        assert!(stats.component("Size").is_none());
    }
}
