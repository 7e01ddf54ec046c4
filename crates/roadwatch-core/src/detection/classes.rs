use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

use super::ClassId;

/// Part a class plays in violation association
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationRole {
    /// Object that can host a violation (e.g. a two-wheeler)
    Carrier,
    /// Presence inside a carrier signals a violation (e.g. an unhelmeted head)
    Marker,
    /// Identifies the carrier (e.g. a number plate)
    Identifier,
}

impl AssociationRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Carrier => "carrier",
            Self::Marker => "marker",
            Self::Identifier => "identifier",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub id: ClassId,
    pub name: String,
    /// Crossings of this class are tallied by the line counter
    pub counted: bool,
    pub role: Option<AssociationRole>,
}

impl ClassInfo {
    pub fn new(id: ClassId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            counted: false,
            role: None,
        }
    }

    pub fn counted(mut self) -> Self {
        self.counted = true;
        self
    }

    pub fn with_role(mut self, role: AssociationRole) -> Self {
        self.role = Some(role);
        self
    }
}

/// Static class id → name/role mapping supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTable {
    classes: BTreeMap<ClassId, ClassInfo>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table for the two-wheeler helmet model
    pub fn helmet_default() -> Self {
        let mut table = Self::new();
        table.insert(
            ClassInfo::new(0, "bike")
                .counted()
                .with_role(AssociationRole::Carrier),
        );
        table.insert(ClassInfo::new(1, "no_helmet").with_role(AssociationRole::Marker));
        table.insert(ClassInfo::new(2, "helmet"));
        table.insert(ClassInfo::new(3, "numberplate").with_role(AssociationRole::Identifier));
        table
    }

    /// Add or replace a class
    pub fn insert(&mut self, info: ClassInfo) -> Option<ClassInfo> {
        self.classes.insert(info.id, info)
    }

    pub fn get(&self, id: ClassId) -> Option<&ClassInfo> {
        self.classes.get(&id)
    }

    pub fn name(&self, id: ClassId) -> Option<&str> {
        self.get(id).map(|info| info.name.as_str())
    }

    pub fn is_counted(&self, id: ClassId) -> bool {
        self.get(id).is_some_and(|info| info.counted)
    }

    pub fn role(&self, id: ClassId) -> Option<AssociationRole> {
        self.get(id).and_then(|info| info.role)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassInfo> {
        self.classes.values()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Load a class table from a text file
    ///
    /// One class per line: `id, name, roles` where `roles` is a `+`-joined
    /// subset of `counted`, `carrier`, `marker`, `identifier` (or `ignored`).
    /// Blank lines and `#` comments are skipped.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("Failed to open class table: {:?}", path))?;
        let table = Self::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse class table: {:?}", path))?;

        info!("Loaded {} classes from {:?}", table.len(), path);
        Ok(table)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut table = Self::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split(',').map(|s| s.trim()).collect();
            if parts.len() != 3 {
                warn!(
                    "Invalid class line {}: '{}' (expected id, name, roles)",
                    line_num + 1,
                    line
                );
                continue;
            }

            let id = parts[0]
                .parse::<ClassId>()
                .with_context(|| format!("Invalid class id at line {}: '{}'", line_num + 1, parts[0]))?;

            let info = match parse_roles(ClassInfo::new(id, parts[1]), parts[2]) {
                Ok(info) => info,
                Err(e) => {
                    warn!("Skipping class line {}: {}", line_num + 1, e);
                    continue;
                }
            };

            if let Some(previous) = table.insert(info) {
                warn!(
                    "Class id {} redefined at line {} (was '{}')",
                    id,
                    line_num + 1,
                    previous.name
                );
            }
        }

        Ok(table)
    }
}

fn parse_roles(mut info: ClassInfo, roles: &str) -> Result<ClassInfo> {
    for role in roles.split('+').map(|s| s.trim()) {
        let association = match role {
            "counted" => {
                info.counted = true;
                continue;
            }
            "ignored" | "" => continue,
            "carrier" => AssociationRole::Carrier,
            "marker" => AssociationRole::Marker,
            "identifier" => AssociationRole::Identifier,
            other => bail!("unknown role '{}'", other),
        };

        if let Some(existing) = info.role {
            bail!(
                "class '{}' has two association roles ({} and {})",
                info.name,
                existing.as_str(),
                association.as_str()
            );
        }
        info.role = Some(association);
    }
    Ok(info)
}
