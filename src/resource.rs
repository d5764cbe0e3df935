//! Resource model: namespaces, types, folder configurations and items.
//!
//! Items are immutable once created and are shared between leaf repositories
//! and merged views as `Arc<ResourceItem>`. The merge engine never mutates an
//! item, it only references and orders them.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A partition key grouping resources from one logical package or library.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceNamespace(String);

impl ResourceNamespace {
    /// The namespace of the application being built.
    pub const RES_AUTO: &'static str = "res-auto";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Shorthand for the application namespace.
    pub fn res_auto() -> Self {
        Self::new(Self::RES_AUTO)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceNamespace {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Kinds of resources a repository can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Anim,
    Animator,
    Array,
    Attr,
    Bool,
    Color,
    Dimen,
    Drawable,
    Font,
    Fraction,
    Id,
    Integer,
    Interpolator,
    Layout,
    Menu,
    Mipmap,
    Navigation,
    Plurals,
    Raw,
    String,
    Style,
    Styleable,
    Transition,
    Xml,
}

impl ResourceType {
    /// Every resource type, in declaration order.
    pub const ALL: [ResourceType; 24] = [
        ResourceType::Anim,
        ResourceType::Animator,
        ResourceType::Array,
        ResourceType::Attr,
        ResourceType::Bool,
        ResourceType::Color,
        ResourceType::Dimen,
        ResourceType::Drawable,
        ResourceType::Font,
        ResourceType::Fraction,
        ResourceType::Id,
        ResourceType::Integer,
        ResourceType::Interpolator,
        ResourceType::Layout,
        ResourceType::Menu,
        ResourceType::Mipmap,
        ResourceType::Navigation,
        ResourceType::Plurals,
        ResourceType::Raw,
        ResourceType::String,
        ResourceType::Style,
        ResourceType::Styleable,
        ResourceType::Transition,
        ResourceType::Xml,
    ];

    /// The name used in resource references, e.g. `string` in `@string/app_name`.
    pub fn name(self) -> &'static str {
        match self {
            ResourceType::Anim => "anim",
            ResourceType::Animator => "animator",
            ResourceType::Array => "array",
            ResourceType::Attr => "attr",
            ResourceType::Bool => "bool",
            ResourceType::Color => "color",
            ResourceType::Dimen => "dimen",
            ResourceType::Drawable => "drawable",
            ResourceType::Font => "font",
            ResourceType::Fraction => "fraction",
            ResourceType::Id => "id",
            ResourceType::Integer => "integer",
            ResourceType::Interpolator => "interpolator",
            ResourceType::Layout => "layout",
            ResourceType::Menu => "menu",
            ResourceType::Mipmap => "mipmap",
            ResourceType::Navigation => "navigation",
            ResourceType::Plurals => "plurals",
            ResourceType::Raw => "raw",
            ResourceType::String => "string",
            ResourceType::Style => "style",
            ResourceType::Styleable => "styleable",
            ResourceType::Transition => "transition",
            ResourceType::Xml => "xml",
        }
    }

    /// Whether several definitions with the same name and configuration may
    /// be visible at the same time.
    ///
    /// Styleables and ids are legitimately declared in multiple places, so
    /// merged views keep every definition of them instead of letting the
    /// highest-priority one shadow the rest.
    pub fn allows_duplicates(self) -> bool {
        matches!(self, ResourceType::Styleable | ResourceType::Id)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ResourceType::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| Error::ConfigParse {
                message: format!("Unknown resource type '{}'", s),
                hint: Some("Use a lowercase type name such as 'string' or 'drawable'".to_string()),
            })
    }
}

/// Locale qualifier: a language with an optional region.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Locale {
    pub language: String,
    pub region: Option<String>,
}

/// Night mode qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NightMode {
    NotNight,
    Night,
}

/// Screen density qualifier, ordered from lowest to highest density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Density {
    Ldpi,
    Mdpi,
    Tvdpi,
    Hdpi,
    Xhdpi,
    Xxhdpi,
    Xxxhdpi,
    Nodpi,
    Anydpi,
}

impl Density {
    const NAMES: [(&'static str, Density); 9] = [
        ("ldpi", Density::Ldpi),
        ("mdpi", Density::Mdpi),
        ("tvdpi", Density::Tvdpi),
        ("hdpi", Density::Hdpi),
        ("xhdpi", Density::Xhdpi),
        ("xxhdpi", Density::Xxhdpi),
        ("xxxhdpi", Density::Xxxhdpi),
        ("nodpi", Density::Nodpi),
        ("anydpi", Density::Anydpi),
    ];

    fn parse(token: &str) -> Option<Density> {
        Self::NAMES
            .iter()
            .find(|(name, _)| *name == token)
            .map(|(_, density)| *density)
    }

    fn name(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(_, density)| *density == self)
            .map(|(name, _)| *name)
            .unwrap_or("nodpi")
    }
}

/// A folder configuration: the qualifier tuple identifying a resource variant.
///
/// The derived ordering compares qualifiers in folder-name order (locale,
/// night mode, density, version). A missing qualifier sorts before any
/// present one, so the default configuration is the smallest.
///
/// Configurations are written the way resource folders name them, with
/// `default` standing for the unqualified configuration:
///
/// ```
/// use resource_merge::resource::FolderConfiguration;
///
/// let config: FolderConfiguration = "fr-rCA-night-xhdpi-v21".parse().unwrap();
/// assert_eq!(config.to_string(), "fr-rCA-night-xhdpi-v21");
/// assert!(FolderConfiguration::default() < config);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FolderConfiguration {
    pub locale: Option<Locale>,
    pub night_mode: Option<NightMode>,
    pub density: Option<Density>,
    pub version: Option<u32>,
}

impl FolderConfiguration {
    pub fn is_default(&self) -> bool {
        *self == FolderConfiguration::default()
    }
}

impl FromStr for FolderConfiguration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut config = FolderConfiguration::default();
        if s.is_empty() || s == "default" {
            return Ok(config);
        }

        let invalid = |message: String| Error::InvalidConfiguration {
            qualifier: s.to_string(),
            message,
        };

        // Qualifiers must appear in canonical order, each at most once.
        let mut stage = 0;
        for token in s.split('-') {
            let next_stage = qualifier_stage(token)
                .ok_or_else(|| invalid(format!("unknown qualifier '{}'", token)))?;
            if next_stage == REGION && stage != LANGUAGE {
                return Err(invalid(format!(
                    "region '{}' must directly follow a language",
                    token
                )));
            }
            if next_stage <= stage {
                return Err(invalid(format!("qualifier '{}' is out of order", token)));
            }

            match next_stage {
                LANGUAGE => {
                    config.locale = Some(Locale {
                        language: token.to_string(),
                        region: None,
                    })
                }
                REGION => {
                    if let Some(locale) = config.locale.as_mut() {
                        locale.region = Some(token[1..].to_string());
                    }
                }
                NIGHT_MODE => {
                    config.night_mode = Some(if token == "night" {
                        NightMode::Night
                    } else {
                        NightMode::NotNight
                    })
                }
                DENSITY => config.density = Density::parse(token),
                _ => config.version = parse_version(token),
            }
            stage = next_stage;
        }
        Ok(config)
    }
}

impl TryFrom<String> for FolderConfiguration {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<FolderConfiguration> for String {
    fn from(config: FolderConfiguration) -> Self {
        config.to_string()
    }
}

impl fmt::Display for FolderConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if let Some(locale) = &self.locale {
            parts.push(locale.language.clone());
            if let Some(region) = &locale.region {
                parts.push(format!("r{}", region));
            }
        }
        match self.night_mode {
            Some(NightMode::Night) => parts.push("night".to_string()),
            Some(NightMode::NotNight) => parts.push("notnight".to_string()),
            None => {}
        }
        if let Some(density) = self.density {
            parts.push(density.name().to_string());
        }
        if let Some(version) = self.version {
            parts.push(format!("v{}", version));
        }

        if parts.is_empty() {
            f.write_str("default")
        } else {
            f.write_str(&parts.join("-"))
        }
    }
}

const LANGUAGE: u8 = 1;
const REGION: u8 = 2;
const NIGHT_MODE: u8 = 3;
const DENSITY: u8 = 4;
const VERSION: u8 = 5;

fn qualifier_stage(token: &str) -> Option<u8> {
    if is_language(token) {
        Some(LANGUAGE)
    } else if is_region(token) {
        Some(REGION)
    } else if token == "night" || token == "notnight" {
        Some(NIGHT_MODE)
    } else if Density::parse(token).is_some() {
        Some(DENSITY)
    } else if parse_version(token).is_some() {
        Some(VERSION)
    } else {
        None
    }
}

fn is_language(token: &str) -> bool {
    (2..=3).contains(&token.len()) && token.chars().all(|c| c.is_ascii_lowercase())
}

fn is_region(token: &str) -> bool {
    token.len() == 3
        && token.starts_with('r')
        && token[1..].chars().all(|c| c.is_ascii_uppercase())
}

fn parse_version(token: &str) -> Option<u32> {
    let digits = token.strip_prefix('v')?;
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

static NEXT_REPOSITORY_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a repository, used by items to point back at their provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RepositoryId(u64);

impl RepositoryId {
    /// Placeholder for items that have not been adopted by a repository yet.
    pub const UNASSIGNED: RepositoryId = RepositoryId(0);

    /// Allocates a process-unique repository id.
    pub fn next() -> Self {
        Self(NEXT_REPOSITORY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An immutable resource record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceItem {
    pub namespace: ResourceNamespace,
    pub resource_type: ResourceType,
    pub name: String,
    pub configuration: FolderConfiguration,
    /// The repository that provides this item.
    pub repository: RepositoryId,
    pub value: Option<String>,
}

impl ResourceItem {
    pub fn new(
        repository: RepositoryId,
        namespace: ResourceNamespace,
        resource_type: ResourceType,
        name: impl Into<String>,
        configuration: FolderConfiguration,
    ) -> Self {
        Self {
            namespace,
            resource_type,
            name: name.into(),
            configuration,
            repository,
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Resource reference in `@type/name` form, namespace-qualified outside
    /// the application namespace.
    pub fn reference(&self) -> String {
        if self.namespace.as_str() == ResourceNamespace::RES_AUTO {
            format!("@{}/{}", self.resource_type, self.name)
        } else {
            format!("@{}:{}/{}", self.namespace, self.resource_type, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(s: &str) -> FolderConfiguration {
        s.parse().unwrap()
    }

    #[test]
    fn test_default_configuration_parses_and_displays() {
        assert!(config("default").is_default());
        assert!(config("").is_default());
        assert_eq!(FolderConfiguration::default().to_string(), "default");
    }

    #[test]
    fn test_full_configuration_round_trips_through_display() {
        let parsed = config("en-rUS-notnight-hdpi-v26");
        assert_eq!(
            parsed.locale,
            Some(Locale {
                language: "en".to_string(),
                region: Some("US".to_string())
            })
        );
        assert_eq!(parsed.night_mode, Some(NightMode::NotNight));
        assert_eq!(parsed.density, Some(Density::Hdpi));
        assert_eq!(parsed.version, Some(26));
        assert_eq!(parsed.to_string(), "en-rUS-notnight-hdpi-v26");
    }

    #[test]
    fn test_configuration_order_is_total_and_default_first() {
        let mut configs = vec![
            config("fr"),
            config("xhdpi"),
            config("default"),
            config("en"),
            config("en-rGB"),
            config("night"),
        ];
        configs.sort();
        let names: Vec<String> = configs.iter().map(|c| c.to_string()).collect();
        assert_eq!(
            names,
            vec!["default", "xhdpi", "night", "en", "en-rGB", "fr"]
        );
    }

    #[test]
    fn test_density_order_follows_pixel_density() {
        assert!(config("ldpi") < config("mdpi"));
        assert!(config("hdpi") < config("xxhdpi"));
    }

    #[test]
    fn test_unknown_qualifier_is_rejected() {
        let err = "en-bogus".parse::<FolderConfiguration>().unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_out_of_order_qualifiers_are_rejected() {
        assert!("hdpi-en".parse::<FolderConfiguration>().is_err());
        assert!("v21-night".parse::<FolderConfiguration>().is_err());
        assert!("rUS".parse::<FolderConfiguration>().is_err());
        assert!("en-fr".parse::<FolderConfiguration>().is_err());
    }

    #[test]
    fn test_configuration_serde_uses_folder_names() {
        let parsed: FolderConfiguration = serde_yaml::from_str("fr-night").unwrap();
        assert_eq!(parsed, config("fr-night"));
        let yaml = serde_yaml::to_string(&parsed).unwrap();
        assert_eq!(yaml.trim(), "fr-night");
    }

    #[test]
    fn test_resource_type_names_round_trip() {
        for ty in ResourceType::ALL {
            assert_eq!(ty.name().parse::<ResourceType>().unwrap(), ty);
        }
        assert!("strings".parse::<ResourceType>().is_err());
    }

    #[test]
    fn test_only_styleable_and_id_allow_duplicates() {
        let duplicates: Vec<ResourceType> = ResourceType::ALL
            .iter()
            .copied()
            .filter(|t| t.allows_duplicates())
            .collect();
        assert_eq!(duplicates, vec![ResourceType::Id, ResourceType::Styleable]);
    }

    #[test]
    fn test_repository_ids_are_unique() {
        let a = RepositoryId::next();
        let b = RepositoryId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_item_reference_qualifies_foreign_namespaces() {
        let repo = RepositoryId::next();
        let local = ResourceItem::new(
            repo,
            ResourceNamespace::res_auto(),
            ResourceType::String,
            "app_name",
            FolderConfiguration::default(),
        );
        assert_eq!(local.reference(), "@string/app_name");

        let library = ResourceItem::new(
            repo,
            ResourceNamespace::new("androidx.appcompat"),
            ResourceType::Color,
            "primary",
            FolderConfiguration::default(),
        );
        assert_eq!(library.reference(), "@androidx.appcompat:color/primary");
    }
}
