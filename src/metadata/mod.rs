//! Access to the instance metadata service.
pub mod fetcher;
pub mod prober;

/// The default link-local instance metadata endpoint.
pub const DEFAULT_METADATA_ENDPOINT: &str = "http://169.254.169.254";

/// Path probed to decide whether the process runs on a cloud instance.
pub const INSTANCE_ID_PATH: &str = "/latest/meta-data/instance-id";
/// Path of the user-data document.
pub const USER_DATA_PATH: &str = "/latest/user-data";
/// Root of the instance attributes.
pub const META_DATA_ROOT: &str = "/latest/meta-data";
/// Path used to request an IMDSv2 session token.
pub const TOKEN_PATH: &str = "/latest/api/token";

/// Instance attributes which can be looked up by name under [META_DATA_ROOT].
pub const KNOWN_ATTRIBUTES: [&str; 16] = [
    "ami-id",
    "ami-launch-index",
    "ami-manifest-path",
    "hostname",
    "instance-action",
    "instance-id",
    "instance-type",
    "local-hostname",
    "local-ipv4",
    "mac",
    "profile",
    "public-hostname",
    "public-ipv4",
    "reservation-id",
    "security-groups",
    "placement/availability-zone",
];

pub fn is_known_attribute(name: &str) -> bool {
    KNOWN_ATTRIBUTES.contains(&name)
}
