//! Component identity extraction from a packaged `config.xml`.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;

use crate::error::{Error, Result};

const DESCRIPTOR_ENTRY: &str = "config.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Widget,
    Operator,
    Mashup,
}

/// `(vendor, name, version)` of a Mashable Application Component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentIdentity {
    pub vendor: String,
    pub name: String,
    pub version: String,
}

impl fmt::Display for ComponentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.vendor, self.name, self.version)
    }
}

/// Explicitly configured identity fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityOverride {
    pub vendor: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
}

impl IdentityOverride {
    /// Complete identity when every field was given.
    pub fn complete(&self) -> Option<ComponentIdentity> {
        Some(ComponentIdentity {
            vendor: self.vendor.clone()?,
            name: self.name.clone()?,
            version: self.version.clone()?,
        })
    }

    pub fn apply(&self, mut identity: ComponentIdentity) -> ComponentIdentity {
        if let Some(vendor) = &self.vendor {
            identity.vendor = vendor.clone();
        }
        if let Some(name) = &self.name {
            identity.name = name.clone();
        }
        if let Some(version) = &self.version {
            identity.version = version.clone();
        }
        identity
    }
}

/// Reads the identity from the package, unless fully overridden.
pub fn resolve_identity(package: &Path, overrides: &IdentityOverride) -> Result<ComponentIdentity> {
    if let Some(identity) = overrides.complete() {
        debug!("Using configured identity {}", identity);
        return Ok(identity);
    }
    let (_, identity) = read_package(package)?;
    Ok(overrides.apply(identity))
}

/// Extracts and parses `config.xml` from a zipped package.
pub fn read_package(package: &Path) -> Result<(ComponentKind, ComponentIdentity)> {
    let content = read_descriptor(package)?;
    parse_descriptor(&content)
}

fn read_descriptor(package: &Path) -> Result<String> {
    let file = File::open(package)
        .map_err(|e| Error::validation(format!("Cannot open {}: {}", package.display(), e)))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| Error::validation(format!("{} is not a valid zip file: {}", package.display(), e)))?;

    let mut entry = match archive.by_name(DESCRIPTOR_ENTRY) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(Error::validation("Zip file did not contain a config.xml file"));
        }
        Err(e) => return Err(Error::validation(format!("Cannot read config.xml: {}", e))),
    };

    let mut content = String::new();
    entry
        .read_to_string(&mut content)
        .map_err(|e| Error::validation(format!("Cannot read config.xml: {}", e)))?;
    Ok(content)
}

pub fn parse_descriptor(content: &str) -> Result<(ComponentKind, ComponentIdentity)> {
    let doc = roxmltree::Document::parse(content)
        .map_err(|e| Error::validation(format!("Invalid config.xml: {}", e)))?;
    let root = doc.root_element();

    let kind = match root.tag_name().name() {
        "widget" => ComponentKind::Widget,
        "operator" => ComponentKind::Operator,
        "mashup" => ComponentKind::Mashup,
        other => {
            return Err(Error::validation(format!(
                "Invalid config.xml: unsupported component type '{}'",
                other
            )));
        }
    };

    let attribute = |name: &str| -> Result<String> {
        root.attribute(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| Error::validation(format!("Invalid config.xml: missing '{}' attribute", name)))
    };

    let identity = ComponentIdentity {
        vendor: attribute("vendor")?,
        name: attribute("name")?,
        version: attribute("version")?,
    };

    if !identity.version.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(Error::validation(format!(
            "Invalid config.xml: bad version '{}'",
            identity.version
        )));
    }

    debug!("Parsed {:?} {}", kind, identity);
    Ok((kind, identity))
}
