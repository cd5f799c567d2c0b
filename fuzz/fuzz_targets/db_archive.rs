#![no_main]

use libfuzzer_sys::fuzz_target;
use scanward_vuln_db::VulnStore;
use scanward_vuln_db::store::DbArchive;

fuzz_target!(|data: &[u8]| {
    if let Ok(archive) = serde_json::from_slice::<DbArchive>(data) {
        let _ = VulnStore::from_archive(archive);
    }
});
