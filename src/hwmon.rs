//! Discovery of GPU hardware monitors under the DRM sysfs tree.
//!
//! GPU drivers expose their hardware monitor at
//! `/sys/class/drm/card<N>/device/hwmon/hwmon<M>/`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::info::SensorError;

/// Default DRM class directory
pub const DRM_ROOT: &str = "/sys/class/drm";

/// Card name (`card0`) to hwmon directory, sorted by card name
pub type Cards = BTreeMap<String, PathBuf>;

/// `card<N>`, excluding connectors like `card0-DP-1`
fn is_card(name: &str) -> bool {
    name.strip_prefix("card")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Sorted directory entries, empty if the directory can't be read
fn entries(dir: &Path) -> Vec<(String, PathBuf)> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .into_iter()
        .flatten()
        .flatten()
        .filter_map(|e| Some((e.file_name().into_string().ok()?, e.path())))
        .collect();
    entries.sort();
    entries
}

/// Find every `card<N>/device/hwmon/hwmon*` directory carrying a `name` entry.
/// When a card exposes several monitors, the lowest numbered one is kept.
pub fn find_gpu_cards(root: &Path) -> Cards {
    let mut cards = Cards::new();
    for (card, card_dir) in entries(root).into_iter().filter(|(n, _)| is_card(n)) {
        let hwmon_root = card_dir.join("device").join("hwmon");
        let found = entries(&hwmon_root)
            .into_iter()
            .find(|(name, dir)| name.starts_with("hwmon") && dir.join("name").is_file());
        if let Some((_, dir)) = found {
            cards.insert(card, dir);
        }
    }
    cards
}

// Read a sysfs file and parse its trimmed content
fn read_sysfs_value<T: FromStr>(path: PathBuf) -> Result<T, SensorError> {
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(source) => return Err(SensorError::Io { path, source }),
    };
    let value = content.trim();
    value.parse().map_err(|_| SensorError::Parse {
        value: value.to_string(),
        path,
    })
}

/// Current gpu load in percent, from `gpu_busy_percent` next to the card's hwmon tree.
/// Reads 0 when the card was not discovered.
pub fn gpu_load(cards: &Cards, card: &str) -> Result<u8, SensorError> {
    let Some(hwmon_dir) = cards.get(card) else {
        return Ok(0);
    };
    // hwmon/hwmon<M> -> device
    let device_dir = hwmon_dir.ancestors().nth(2).unwrap_or(hwmon_dir);
    let percent: u32 = read_sysfs_value(device_dir.join("gpu_busy_percent"))?;
    Ok(percent.min(100) as u8)
}

/// Current gpu temperature in whole degrees celsius, from the card's `temp1_input`.
/// Reads 0 when the card was not discovered.
pub fn gpu_temp(cards: &Cards, card: &str) -> Result<u16, SensorError> {
    let Some(hwmon_dir) = cards.get(card) else {
        return Ok(0);
    };
    let millidegrees: i64 = read_sysfs_value(hwmon_dir.join("temp1_input"))?;
    Ok((millidegrees / 1000).clamp(0, u16::MAX.into()) as u16)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Throwaway sysfs tree, removed on drop
    pub(crate) struct FakeSysfs(pub(crate) PathBuf);

    impl FakeSysfs {
        pub(crate) fn new(name: &str) -> Self {
            let root = std::env::temp_dir().join(format!(
                "deepcool-sync-{}-{name}",
                std::process::id()
            ));
            let _ = fs::remove_dir_all(&root);
            fs::create_dir_all(&root).unwrap();
            Self(root)
        }

        pub(crate) fn write(&self, rel: &str, content: &str) {
            let path = self.0.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }

    impl Drop for FakeSysfs {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    fn amdgpu(name: &str) -> FakeSysfs {
        let sysfs = FakeSysfs::new(name);
        sysfs.write("card1/device/hwmon/hwmon4/name", "amdgpu\n");
        sysfs.write("card1/device/gpu_busy_percent", "12\n");
        sysfs.write("card0/device/hwmon/hwmon2/name", "amdgpu\n");
        sysfs.write("card0/device/hwmon/hwmon2/temp1_input", "48500\n");
        sysfs.write("card0/device/gpu_busy_percent", "37\n");
        sysfs.write("card0-DP-1/status", "connected\n");
        sysfs.write("renderD128/dev", "226:128\n");
        sysfs
    }

    #[test]
    fn card_names() {
        assert!(is_card("card0"));
        assert!(is_card("card12"));
        assert!(!is_card("card"));
        assert!(!is_card("card0-DP-1"));
        assert!(!is_card("renderD128"));
    }

    #[test]
    fn discovers_cards_sorted() {
        let sysfs = amdgpu("discover");
        let cards = find_gpu_cards(&sysfs.0);
        let names: Vec<_> = cards.keys().cloned().collect();
        assert_eq!(names, ["card0", "card1"]);
        assert_eq!(
            cards["card0"],
            sysfs.0.join("card0/device/hwmon/hwmon2")
        );
    }

    #[test]
    fn skips_monitors_without_name() {
        let sysfs = FakeSysfs::new("unnamed");
        sysfs.write("card0/device/hwmon/hwmon1/temp1_input", "40000");
        sysfs.write("card0/device/hwmon/hwmon3/name", "nouveau");
        let cards = find_gpu_cards(&sysfs.0);
        assert_eq!(cards["card0"], sysfs.0.join("card0/device/hwmon/hwmon3"));
    }

    #[test]
    fn missing_root_is_empty() {
        let cards = find_gpu_cards(Path::new("/nonexistent/deepcool-sync/drm"));
        assert!(cards.is_empty());
    }

    #[test]
    fn reads_gpu_load_and_temp() {
        let sysfs = amdgpu("read");
        let cards = find_gpu_cards(&sysfs.0);
        assert_eq!(gpu_load(&cards, "card0").unwrap(), 37);
        assert_eq!(gpu_load(&cards, "card1").unwrap(), 12);
        assert_eq!(gpu_temp(&cards, "card0").unwrap(), 48);
    }

    #[test]
    fn negative_temp_floors_at_zero() {
        let sysfs = amdgpu("subzero");
        sysfs.write("card0/device/hwmon/hwmon2/temp1_input", "-4000\n");
        let cards = find_gpu_cards(&sysfs.0);
        assert_eq!(gpu_temp(&cards, "card0").unwrap(), 0);
    }

    #[test]
    fn undiscovered_card_reads_zero() {
        let cards = Cards::new();
        assert_eq!(gpu_load(&cards, "card0").unwrap(), 0);
        assert_eq!(gpu_temp(&cards, "card0").unwrap(), 0);
    }

    #[test]
    fn garbage_load_is_an_error() {
        let sysfs = amdgpu("garbage");
        sysfs.write("card0/device/gpu_busy_percent", "busy\n");
        let cards = find_gpu_cards(&sysfs.0);
        match gpu_load(&cards, "card0") {
            Err(SensorError::Parse { value, .. }) => assert_eq!(value, "busy"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn missing_load_file_is_an_error() {
        let sysfs = amdgpu("missing");
        fs::remove_file(sysfs.0.join("card1/device/gpu_busy_percent")).unwrap();
        let cards = find_gpu_cards(&sysfs.0);
        assert!(matches!(
            gpu_load(&cards, "card1"),
            Err(SensorError::Io { .. })
        ));
    }
}
