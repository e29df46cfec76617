use std::fmt;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Patient,
    Appointment,
    User,
    Inquiry,
    Service,
    Status,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Patient => "Patient",
            Self::Appointment => "Appointment",
            Self::User => "User",
            Self::Inquiry => "Inquiry",
            Self::Service => "Service",
            Self::Status => "Status",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routes invalidation: a whole collection or a single record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    List(ResourceKind),
    Item(ResourceKind, String),
}

impl Tag {
    pub fn list(kind: ResourceKind) -> Self {
        Self::List(kind)
    }

    pub fn item(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self::Item(kind, id.into())
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::List(kind) | Self::Item(kind, _) => *kind,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(kind) => write!(f, "{kind}:LIST"),
            Self::Item(kind, id) => write!(f, "{kind}:{id}"),
        }
    }
}

/// A tag with the record id left open, as written in endpoint declarations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TagTemplate {
    List(ResourceKind),
    Item(ResourceKind),
}

impl TagTemplate {
    pub fn kind(self) -> ResourceKind {
        match self {
            Self::List(kind) | Self::Item(kind) => kind,
        }
    }

    pub fn resolve(self, id: Option<&str>) -> Option<Tag> {
        match self {
            Self::List(kind) => Some(Tag::List(kind)),
            Self::Item(kind) => id.map(|id| Tag::item(kind, id)),
        }
    }
}

impl fmt::Display for TagTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(kind) => write!(f, "{kind}:LIST"),
            Self::Item(kind) => write!(f, "{kind}:<id>"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointKind {
    Query,
    Mutation,
}

/// One edge set of the tag graph: what a query provides or what a
/// mutation invalidates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndpointDecl {
    pub name: &'static str,
    pub kind: EndpointKind,
    pub tags: &'static [TagTemplate],
}

impl EndpointDecl {
    pub const fn query(name: &'static str, provides: &'static [TagTemplate]) -> Self {
        Self {
            name,
            kind: EndpointKind::Query,
            tags: provides,
        }
    }

    pub const fn mutation(name: &'static str, invalidates: &'static [TagTemplate]) -> Self {
        Self {
            name,
            kind: EndpointKind::Mutation,
            tags: invalidates,
        }
    }

    /// Item templates are dropped when no id is known (e.g. on create).
    pub fn resolve(&self, id: Option<&str>) -> Vec<Tag> {
        self.tags
            .iter()
            .filter_map(|template| template.resolve(id))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TagGraphViolation {
    #[error("mutation '{mutation}' declares no invalidation")]
    Inert { mutation: &'static str },
    #[error("mutation '{mutation}' invalidates {kind} items without {kind}:LIST")]
    ItemWithoutList {
        mutation: &'static str,
        kind: ResourceKind,
    },
    #[error("mutation '{mutation}' invalidates {tag}, which no query provides")]
    Unprovided {
        mutation: &'static str,
        tag: TagTemplate,
    },
}

/// Queries and mutations linked through the tag templates they declare.
#[derive(Clone, Debug, Default)]
pub struct TagGraph {
    endpoints: Vec<EndpointDecl>,
}

impl TagGraph {
    pub fn new<'a>(decls: impl IntoIterator<Item = &'a EndpointDecl>) -> Self {
        Self {
            endpoints: decls.into_iter().copied().collect(),
        }
    }

    pub fn endpoints(&self) -> &[EndpointDecl] {
        &self.endpoints
    }

    pub fn providers(&self, tag: TagTemplate) -> impl Iterator<Item = &EndpointDecl> + '_ {
        self.edges(EndpointKind::Query, tag)
    }

    pub fn invalidators(&self, tag: TagTemplate) -> impl Iterator<Item = &EndpointDecl> + '_ {
        self.edges(EndpointKind::Mutation, tag)
    }

    pub fn check(&self) -> Result<(), Vec<TagGraphViolation>> {
        let mut violations = Vec::new();

        for mutation in self
            .endpoints
            .iter()
            .filter(|decl| decl.kind == EndpointKind::Mutation)
        {
            if mutation.tags.is_empty() {
                violations.push(TagGraphViolation::Inert {
                    mutation: mutation.name,
                });
            }

            for tag in mutation.tags {
                if let TagTemplate::Item(kind) = tag
                    && !mutation.tags.contains(&TagTemplate::List(*kind))
                {
                    violations.push(TagGraphViolation::ItemWithoutList {
                        mutation: mutation.name,
                        kind: *kind,
                    });
                }

                if self.providers(*tag).next().is_none() {
                    violations.push(TagGraphViolation::Unprovided {
                        mutation: mutation.name,
                        tag: *tag,
                    });
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    fn edges(&self, kind: EndpointKind, tag: TagTemplate) -> impl Iterator<Item = &EndpointDecl> + '_ {
        self.endpoints
            .iter()
            .filter(move |decl| decl.kind == kind && decl.tags.contains(&tag))
    }
}

#[cfg(test)]
mod tests {
    use super::{EndpointDecl, ResourceKind, Tag, TagGraph, TagGraphViolation, TagTemplate};

    const LIST: TagTemplate = TagTemplate::List(ResourceKind::Appointment);
    const ITEM: TagTemplate = TagTemplate::Item(ResourceKind::Appointment);

    #[test]
    fn tags_render_as_kind_and_key() {
        assert_eq!(Tag::list(ResourceKind::Appointment).to_string(), "Appointment:LIST");
        assert_eq!(Tag::item(ResourceKind::Patient, "p-4").to_string(), "Patient:p-4");
    }

    #[test]
    fn resolve_drops_item_templates_without_an_id() {
        let update = EndpointDecl::mutation("update", &[LIST, ITEM]);
        assert_eq!(
            update.resolve(Some("a-1")),
            vec![
                Tag::list(ResourceKind::Appointment),
                Tag::item(ResourceKind::Appointment, "a-1")
            ]
        );
        assert_eq!(update.resolve(None), vec![Tag::list(ResourceKind::Appointment)]);
    }

    #[test]
    fn flags_item_invalidation_without_list() {
        let graph = TagGraph::new(&[
            EndpointDecl::query("list", &[LIST, ITEM]),
            EndpointDecl::mutation("update", &[ITEM]),
        ]);

        assert_eq!(
            graph.check(),
            Err(vec![TagGraphViolation::ItemWithoutList {
                mutation: "update",
                kind: ResourceKind::Appointment,
            }])
        );
    }

    #[test]
    fn flags_invalidations_nobody_listens_to() {
        let graph = TagGraph::new(&[
            EndpointDecl::query("list", &[LIST]),
            EndpointDecl::mutation("update", &[LIST, ITEM]),
            EndpointDecl::mutation("noop", &[]),
        ]);

        let violations = graph.check().expect_err("graph is incomplete");
        assert!(violations.contains(&TagGraphViolation::Unprovided {
            mutation: "update",
            tag: ITEM,
        }));
        assert!(violations.contains(&TagGraphViolation::Inert { mutation: "noop" }));
    }

    #[test]
    fn complete_graph_passes() {
        let graph = TagGraph::new(&[
            EndpointDecl::query("list", &[LIST, ITEM]),
            EndpointDecl::query("get", &[ITEM]),
            EndpointDecl::mutation("create", &[LIST]),
            EndpointDecl::mutation("update", &[LIST, ITEM]),
        ]);

        assert_eq!(graph.check(), Ok(()));
        assert_eq!(graph.providers(ITEM).count(), 2);
        assert_eq!(graph.invalidators(LIST).count(), 2);
    }
}
