use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use uuid::Uuid;

/*
Note on the two "device id" key names:

Qoder stores the same uuid under both `telemetry.devDeviceId` and
`storage.serviceMachineId`. The second key is a historical alias, so
`IdentitySet` keeps a single field and exposes the alias through
`storage_entries`.
*/

pub const DEV_DEVICE_ID_KEY: &str = "telemetry.devDeviceId";
pub const MACHINE_ID_KEY: &str = "telemetry.machineId";
pub const MAC_MACHINE_ID_KEY: &str = "telemetry.macMachineId";
pub const SQM_ID_KEY: &str = "telemetry.sqmId";
pub const SERVICE_MACHINE_ID_KEY: &str = "storage.serviceMachineId";

/// The bundle of telemetry identifiers Qoder persists for one device.
/// Always generated as a unit; a reset replaces the whole set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentitySet {
    pub dev_device_id: String,
    pub machine_id: String,
    pub mac_machine_id: String,
    pub sqm_id: String,
}

impl IdentitySet {
    /// Draw a fresh identifier set from the thread-local CSPRNG.
    ///
    /// An exhausted random source panics inside `rand`; that is fatal
    /// and not worth modeling as a recoverable error.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();

        let mut seed = [0u8; 32];
        rng.fill_bytes(&mut seed);
        let machine_id = hex::encode(Sha256::digest(seed));

        let mut seed = [0u8; 64];
        rng.fill_bytes(&mut seed);
        let mac_machine_id = hex::encode(Sha512::digest(seed));

        Self {
            dev_device_id: Uuid::new_v4().to_string(),
            machine_id,
            mac_machine_id,
            sqm_id: braced_uuid(),
        }
    }

    /// The alias key value: same uuid as `dev_device_id`.
    pub fn service_machine_id(&self) -> &str {
        &self.dev_device_id
    }

    /// All five storage entries, including the alias key.
    pub fn storage_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            (DEV_DEVICE_ID_KEY, self.dev_device_id.clone()),
            (MACHINE_ID_KEY, self.machine_id.clone()),
            (MAC_MACHINE_ID_KEY, self.mac_machine_id.clone()),
            (SQM_ID_KEY, self.sqm_id.clone()),
            (SERVICE_MACHINE_ID_KEY, self.dev_device_id.clone()),
        ]
    }
}

/// An uppercase uuid wrapped in braces, e.g. `{1C5E…}`.
/// Qoder uses this format for `telemetry.sqmId` and the SQM registry value.
pub fn braced_uuid() -> String {
    format!("{{{}}}", Uuid::new_v4().to_string().to_uppercase())
}
