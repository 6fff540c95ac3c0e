//! Package lifecycle phases.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One step of a package's lifecycle.
///
/// The declaration order carries no meaning; the order in which phases run
/// comes from the [`PackageDescriptor`](crate::PackageDescriptor).
///
/// ```
/// use pkgscan_dynamic::RunPhase;
///
/// assert_eq!("install".parse::<RunPhase>().ok(), Some(RunPhase::Install));
/// assert_eq!(RunPhase::Execute.to_string(), "execute");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RunPhase {
    /// Fetching the package archive.
    Download,
    /// Running the package manager's install step, including install hooks.
    Install,
    /// Importing or requiring the installed package.
    Import,
    /// Running the package's entry points.
    Execute,
}
