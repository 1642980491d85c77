//! KDL schema for the project configuration file (`devtrack.kdl`).
//!
//! # KDL Schema
//!
//! ```kdl
//! // Components in declaration order; order breaks ties in planning.
//! component "database"
//! component "api" {
//!     depends-on "database" "authentication"
//! }
//!
//! // Default milestones created at bootstrap.
//! milestone "MVP" {
//!     target-date "2026-12-01"
//!     description "First usable cut"
//!     components "database" "api"
//! }
//!
//! // Number of activity entries included in diagnostic reports.
//! report-recent-activity 10
//! ```

use chrono::NaiveDate;
use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::Serialize;
use std::collections::HashSet;

use crate::models::graph::DependencyGraph;
use crate::{Error, Result};

/// Default number of activity entries bundled into a diagnostic report.
pub const DEFAULT_RECENT_ACTIVITY: usize = 10;

/// A declared component and its direct prerequisites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentConfig {
    pub name: String,
    pub depends_on: Vec<String>,
}

impl ComponentConfig {
    pub fn new(name: &str, depends_on: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// A milestone created at bootstrap with predefined component associations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MilestoneConfig {
    pub name: String,
    pub target_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub components: Vec<String>,
}

/// Project configuration: the closed component set, the dependency table and
/// the default milestones. Fixed for the lifetime of a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectConfig {
    pub components: Vec<ComponentConfig>,
    pub milestones: Vec<MilestoneConfig>,
    pub recent_activity: usize,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProjectConfig {
    /// The built-in project layout used when no `devtrack.kdl` is present.
    pub fn builtin() -> Self {
        let components = vec![
            ComponentConfig::new("database", &[]),
            ComponentConfig::new("authentication", &["database"]),
            ComponentConfig::new("api", &["database", "authentication"]),
            ComponentConfig::new("admin-ui", &["api", "authentication"]),
            ComponentConfig::new("realtime-server", &["api"]),
            ComponentConfig::new("draw-engine", &["realtime-server"]),
            ComponentConfig::new("notifications", &["realtime-server"]),
            ComponentConfig::new("testing", &["admin-ui", "draw-engine", "notifications"]),
            ComponentConfig::new("deployment", &["testing"]),
        ];

        let milestone = |name: &str, date: (i32, u32, u32), description: &str, members: &[&str]| {
            MilestoneConfig {
                name: name.to_string(),
                target_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
                description: Some(description.to_string()),
                components: members.iter().map(|m| m.to_string()).collect(),
            }
        };
        let milestones = vec![
            milestone(
                "Foundation",
                (2026, 11, 15),
                "Data layer, authentication and core API",
                &["database", "authentication", "api"],
            ),
            milestone(
                "Admin Console",
                (2026, 12, 15),
                "Administrative interface on top of the API",
                &["admin-ui"],
            ),
            milestone(
                "Live Draw",
                (2027, 1, 31),
                "Realtime server, draw engine and notifications",
                &["realtime-server", "draw-engine", "notifications"],
            ),
            milestone(
                "Production Launch",
                (2027, 3, 1),
                "End-to-end testing and deployment",
                &["testing", "deployment"],
            ),
        ];

        Self {
            components,
            milestones,
            recent_activity: DEFAULT_RECENT_ACTIVITY,
        }
    }

    /// Names of all configured components, in declaration order.
    pub fn component_names(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.name.as_str()).collect()
    }

    /// Build the immutable dependency graph from the declared edge table.
    pub fn graph(&self) -> DependencyGraph {
        DependencyGraph::new(
            self.components
                .iter()
                .map(|c| (c.name.clone(), c.depends_on.clone())),
        )
    }

    /// Validate the configuration.
    ///
    /// Rejects duplicate names, references to undeclared components and
    /// dependency cycles.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for component in &self.components {
            if component.name.trim().is_empty() {
                return Err(Error::Config("component names must not be empty".to_string()));
            }
            if !seen.insert(component.name.as_str()) {
                return Err(Error::Config(format!(
                    "component '{}' is declared more than once",
                    component.name
                )));
            }
        }

        for component in &self.components {
            for dep in &component.depends_on {
                if !seen.contains(dep.as_str()) {
                    return Err(Error::Config(format!(
                        "component '{}' depends on undeclared component '{}'",
                        component.name, dep
                    )));
                }
            }
        }

        let mut milestone_names = HashSet::new();
        for milestone in &self.milestones {
            if !milestone_names.insert(milestone.name.as_str()) {
                return Err(Error::Config(format!(
                    "milestone '{}' is declared more than once",
                    milestone.name
                )));
            }
            for member in &milestone.components {
                if !seen.contains(member.as_str()) {
                    return Err(Error::Config(format!(
                        "milestone '{}' references undeclared component '{}'",
                        milestone.name, member
                    )));
                }
            }
        }

        if let Some(cycle) = self.graph().find_cycle() {
            return Err(Error::CyclicDependency(cycle));
        }

        Ok(())
    }

    /// Parse configuration from a KDL document.
    ///
    /// Unknown top-level nodes are ignored for forward compatibility. An
    /// unparseable milestone target date is a configuration error.
    pub fn from_kdl(doc: &KdlDocument) -> Result<Self> {
        let mut config = Self {
            components: Vec::new(),
            milestones: Vec::new(),
            recent_activity: DEFAULT_RECENT_ACTIVITY,
        };

        for node in doc.nodes() {
            match node.name().value() {
                "component" => config.components.push(parse_component_node(node)?),
                "milestone" => config.milestones.push(parse_milestone_node(node)?),
                "report-recent-activity" => {
                    if let Some(n) = node.entries().first().and_then(|e| e.value().as_integer()) {
                        config.recent_activity = usize::try_from(n).map_err(|_| {
                            Error::Config(format!("report-recent-activity must be >= 0, got {}", n))
                        })?;
                    }
                }
                _ => {
                    // Ignore unknown fields for forward compatibility
                }
            }
        }

        Ok(config)
    }

    /// Convert configuration to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        for component in &self.components {
            let mut node = string_node("component", [component.name.as_str()]);
            if !component.depends_on.is_empty() {
                let mut children = KdlDocument::new();
                children.nodes_mut().push(string_node(
                    "depends-on",
                    component.depends_on.iter().map(String::as_str),
                ));
                node.set_children(children);
            }
            doc.nodes_mut().push(node);
        }

        for milestone in &self.milestones {
            let mut node = string_node("milestone", [milestone.name.as_str()]);
            let mut children = KdlDocument::new();
            if let Some(date) = milestone.target_date {
                let date = date.format("%Y-%m-%d").to_string();
                children
                    .nodes_mut()
                    .push(string_node("target-date", [date.as_str()]));
            }
            if let Some(ref description) = milestone.description {
                children
                    .nodes_mut()
                    .push(string_node("description", [description.as_str()]));
            }
            if !milestone.components.is_empty() {
                children.nodes_mut().push(string_node(
                    "components",
                    milestone.components.iter().map(String::as_str),
                ));
            }
            node.set_children(children);
            doc.nodes_mut().push(node);
        }

        let mut node = KdlNode::new("report-recent-activity");
        node.push(KdlEntry::new(KdlValue::Integer(self.recent_activity as i128)));
        doc.nodes_mut().push(node);

        doc.autoformat();
        doc
    }
}

fn string_node<'a>(name: &str, args: impl IntoIterator<Item = &'a str>) -> KdlNode {
    let mut node = KdlNode::new(name);
    for arg in args {
        node.push(KdlEntry::new(KdlValue::String(arg.to_string())));
    }
    node
}

/// Get a string argument from a node's first entry.
fn get_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .first()
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

/// Get every positional string argument of a node.
fn get_string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}

fn parse_component_node(node: &KdlNode) -> Result<ComponentConfig> {
    let name = get_string_arg(node)
        .ok_or_else(|| Error::Config("component node must have a name argument".to_string()))?;

    let mut depends_on = Vec::new();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            if child.name().value() == "depends-on" {
                for dep in get_string_args(child) {
                    if !depends_on.contains(&dep) {
                        depends_on.push(dep);
                    }
                }
            }
        }
    }

    Ok(ComponentConfig { name, depends_on })
}

fn parse_milestone_node(node: &KdlNode) -> Result<MilestoneConfig> {
    let name = get_string_arg(node)
        .ok_or_else(|| Error::Config("milestone node must have a name argument".to_string()))?;

    let mut milestone = MilestoneConfig {
        name,
        target_date: None,
        description: None,
        components: Vec::new(),
    };

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "target-date" => {
                    if let Some(raw) = get_string_arg(child) {
                        let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                            Error::Config(format!(
                                "milestone '{}' has invalid target-date '{}' (expected YYYY-MM-DD)",
                                milestone.name, raw
                            ))
                        })?;
                        milestone.target_date = Some(date);
                    }
                }
                "description" => milestone.description = get_string_arg(child),
                "components" => {
                    for member in get_string_args(child) {
                        if !milestone.components.contains(&member) {
                            milestone.components.push(member);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    Ok(milestone)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(kdl: &str) -> Result<ProjectConfig> {
        let doc: KdlDocument = kdl.parse().unwrap();
        ProjectConfig::from_kdl(&doc)
    }

    #[test]
    fn test_builtin_is_valid() {
        let config = ProjectConfig::builtin();
        config.validate().unwrap();
        assert_eq!(config.components[0].name, "database");
        assert!(config.graph().has_edges());
    }

    #[test]
    fn test_parse_components_and_dependencies() {
        let config = parse(
            r#"
            component "database"
            component "api" {
                depends-on "database"
            }
            component "ui" {
                depends-on "api" "database"
            }
            "#,
        )
        .unwrap();

        assert_eq!(config.component_names(), vec!["database", "api", "ui"]);
        assert_eq!(config.components[2].depends_on, vec!["api", "database"]);
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_milestones() {
        let config = parse(
            r#"
            component "database"
            milestone "MVP" {
                target-date "2026-12-01"
                description "First cut"
                components "database" "database"
            }
            report-recent-activity 5
            "#,
        )
        .unwrap();

        let mvp = &config.milestones[0];
        assert_eq!(mvp.name, "MVP");
        assert_eq!(mvp.target_date, NaiveDate::from_ymd_opt(2026, 12, 1));
        assert_eq!(mvp.description.as_deref(), Some("First cut"));
        assert_eq!(mvp.components, vec!["database"]);
        assert_eq!(config.recent_activity, 5);
    }

    #[test]
    fn test_invalid_target_date_is_config_error() {
        let result = parse(
            r#"
            milestone "MVP" {
                target-date "next tuesday"
            }
            "#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_component_without_name_is_rejected() {
        assert!(matches!(parse("component"), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_dependency() {
        let config = parse(
            r#"
            component "api" {
                depends-on "database"
            }
            "#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("undeclared component 'database'"));
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let config = parse(
            r#"
            component "api"
            component "api"
            "#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_milestone_member() {
        let config = parse(
            r#"
            component "api"
            milestone "MVP" {
                components "api" "ui"
            }
            "#,
        )
        .unwrap();
        assert!(config.validate().unwrap_err().to_string().contains("'ui'"));
    }

    #[test]
    fn test_validate_rejects_cycles() {
        let config = parse(
            r#"
            component "a" {
                depends-on "b"
            }
            component "b" {
                depends-on "a"
            }
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(Error::CyclicDependency(_))
        ));
    }

    #[test]
    fn test_to_kdl_parses_back() {
        let config = ProjectConfig::builtin();
        let text = config.to_kdl().to_string();
        let reparsed = parse(&text).unwrap();
        assert_eq!(reparsed, config);
    }
}
