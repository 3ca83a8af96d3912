//! Benchmark variants and executable naming
//!
//! A variant is one container configuration of the C++ performance test
//! (`performance_test_sequence.cpp`): which container holds the values
//! and whether storage is reserved up front. Together with an array size
//! it names exactly one compiled executable.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::{
    constants::{CATALOG_ARRAY_SIZES, EXECUTABLE_PREFIX, NAME_SEPARATOR},
    error::DriverError,
};

/// Container under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContainerKind {
    Deque,
    List,
    MovingVector,
    Vector,
}

impl ContainerKind {
    pub const ALL: [ContainerKind; 4] = [
        ContainerKind::Deque,
        ContainerKind::List,
        ContainerKind::MovingVector,
        ContainerKind::Vector,
    ];

    /// Name used in labels and executable names
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::Deque => "deque",
            ContainerKind::List => "list",
            ContainerKind::MovingVector => "moving_vector",
            ContainerKind::Vector => "vector",
        }
    }

    /// Reserve modes the container is built with.
    ///
    /// Node-based containers have nothing to reserve, so only the
    /// contiguous ones get a `RESERVE` build.
    pub fn reserve_modes(&self) -> &'static [ReserveMode] {
        match self {
            ContainerKind::Deque | ContainerKind::List => &[ReserveMode::NoReserve],
            ContainerKind::MovingVector | ContainerKind::Vector => {
                &[ReserveMode::Reserve, ReserveMode::NoReserve]
            }
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

/// Whether the container reserves capacity before filling
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReserveMode {
    Reserve,
    NoReserve,
}

impl ReserveMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReserveMode::Reserve => "RESERVE",
            ReserveMode::NoReserve => "NO_RESERVE",
        }
    }
}

/// One benchmark executable identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variant {
    pub container: ContainerKind,
    pub reserve: ReserveMode,
}

impl Variant {
    /// Create a variant, rejecting reserve modes the container is never built with
    pub fn new(container: ContainerKind, reserve: ReserveMode) -> Result<Self, DriverError> {
        if !container.reserve_modes().contains(&reserve) {
            return Err(DriverError::InvalidVariant(format!(
                "{}{}{} is not built",
                container.as_str(),
                NAME_SEPARATOR,
                reserve.as_str()
            )));
        }
        Ok(Self { container, reserve })
    }

    /// Every variant the performance build produces
    pub fn catalog() -> Vec<Variant> {
        ContainerKind::ALL
            .iter()
            .flat_map(|container| {
                container.reserve_modes().iter().map(|reserve| Variant {
                    container: *container,
                    reserve: *reserve,
                })
            })
            .collect()
    }

    /// Label of the form `<container>_<reserve>`
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.container.as_str(),
            NAME_SEPARATOR,
            self.reserve.as_str()
        )
    }
}

impl FromStr for Variant {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Container names contain the separator themselves (`moving_vector`),
        // so split on the reserve suffix rather than on the first `_`.
        let label = s.trim();
        let (container, reserve) = [ReserveMode::NoReserve, ReserveMode::Reserve]
            .into_iter()
            .find_map(|mode| {
                label
                    .strip_suffix(mode.as_str())
                    .and_then(|rest| rest.strip_suffix(NAME_SEPARATOR))
                    .map(|container| (container, mode))
            })
            .ok_or_else(|| DriverError::InvalidVariant(s.to_string()))?;

        let container = ContainerKind::from_name(container)
            .ok_or_else(|| DriverError::InvalidVariant(s.to_string()))?;

        Variant::new(container, reserve)
    }
}

impl Serialize for Variant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Array-size class swept across all variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ArraySize(u32);

impl ArraySize {
    pub fn new(size: u32) -> Result<Self, DriverError> {
        if size == 0 {
            return Err(DriverError::InvalidArraySize(size.to_string()));
        }
        Ok(Self(size))
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Every array size the performance build produces
    pub fn catalog() -> Vec<ArraySize> {
        CATALOG_ARRAY_SIZES.iter().map(|size| ArraySize(*size)).collect()
    }
}

impl fmt::Display for ArraySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ArraySize {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let size = s
            .trim()
            .parse::<u32>()
            .map_err(|_| DriverError::InvalidArraySize(s.to_string()))?;
        ArraySize::new(size)
    }
}

/// File name of the executable benchmarking `variant` at `array_size`
pub fn executable_name(variant: &Variant, array_size: ArraySize) -> String {
    format!(
        "{prefix}{sep}{variant}{sep}{size}",
        prefix = EXECUTABLE_PREFIX,
        sep = NAME_SEPARATOR,
        size = array_size
    )
}

/// Resolves executable names inside the binary directory
#[derive(Debug, Clone)]
pub struct ExecutableNaming {
    bin_dir: PathBuf,
}

impl ExecutableNaming {
    pub fn new(bin_dir: impl Into<PathBuf>) -> Self {
        Self {
            bin_dir: bin_dir.into(),
        }
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Path of the executable for one cell of the matrix.
    ///
    /// Always carries a directory component so the launch never falls back
    /// to a `PATH` search.
    pub fn path_for(&self, variant: &Variant, array_size: ArraySize) -> PathBuf {
        let dir = if self.bin_dir.as_os_str().is_empty() {
            Path::new(crate::constants::DEFAULT_BIN_DIR)
        } else {
            self.bin_dir.as_path()
        };
        dir.join(executable_name(variant, array_size))
    }
}

impl Default for ExecutableNaming {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_BIN_DIR)
    }
}
