use crate::pal::{BuildTargetFilesystem, Filesystem};

// Keys that carry the processor brand, in order of preference. x86 kernels publish
// "model name"; ARM kernels use "Hardware" or "Processor" depending on version.
const BRAND_KEYS: [&str; 3] = ["model name", "Hardware", "Processor"];

/// Identifies the current machine by its CPU brand, in a form that is safe to embed in a file
/// name.
///
/// Falls back to the target architecture (e.g. `x86_64`) if the platform does not publish a
/// processor description.
#[must_use]
pub fn machine_name() -> String {
    machine_name_from(&BuildTargetFilesystem)
}

fn machine_name_from(fs: &impl Filesystem) -> String {
    let brand = fs
        .read_cpuinfo()
        .ok()
        .and_then(|cpuinfo| cpu_brand(&cpuinfo));

    file_name_safe(&brand.unwrap_or_else(|| std::env::consts::ARCH.to_string()))
}

fn cpu_brand(cpuinfo: &str) -> Option<String> {
    BRAND_KEYS.iter().find_map(|key| {
        cpuinfo
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim() == *key)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}

fn file_name_safe(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(['/', '\\'], "_")
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::io;

    use super::*;
    use crate::pal::MockFilesystem;

    fn mock_cpuinfo(result: io::Result<&'static str>) -> MockFilesystem {
        let mut fs = MockFilesystem::new();
        let mut result = Some(result.map(str::to_string));
        fs.expect_read_cpuinfo()
            .times(1)
            .returning(move || result.take().unwrap());
        fs
    }

    #[test]
    fn x86_model_name() {
        let fs = mock_cpuinfo(Ok("processor\t: 0\n\
             vendor_id\t: GenuineIntel\n\
             model name\t: Intel(R) Core(TM) i7-8700K CPU @ 3.70GHz\n\
             processor\t: 1\n\
             model name\t: Intel(R) Core(TM) i7-8700K CPU @ 3.70GHz\n"));

        assert_eq!(
            machine_name_from(&fs),
            "Intel(R) Core(TM) i7-8700K CPU @ 3.70GHz"
        );
    }

    #[test]
    fn arm_hardware_line() {
        let fs = mock_cpuinfo(Ok("processor\t: 0\n\
             BogoMIPS\t: 108.00\n\
             Hardware\t: BCM2835\n"));

        assert_eq!(machine_name_from(&fs), "BCM2835");
    }

    #[test]
    fn separators_are_replaced() {
        let fs = mock_cpuinfo(Ok("model name : AMD  Ryzen 9/7950X\\16-Core\n"));

        assert_eq!(machine_name_from(&fs), "AMD Ryzen 9_7950X_16-Core");
    }

    #[test]
    fn unreadable_cpuinfo_falls_back_to_arch() {
        let fs = mock_cpuinfo(Err(io::Error::new(io::ErrorKind::NotFound, "no procfs")));

        assert_eq!(machine_name_from(&fs), std::env::consts::ARCH);
    }

    #[test]
    fn blank_brand_falls_back_to_arch() {
        let fs = mock_cpuinfo(Ok("processor\t: 0\nmodel name\t:   \n"));

        assert_eq!(machine_name_from(&fs), std::env::consts::ARCH);
    }
}
