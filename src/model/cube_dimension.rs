//! Read-only view over one property shape of a cube

use crate::rdf::{cube, schema, sh, Dataset, Literal, NamedNode, RdfObject, RdfPredicate, RdfSubject};

/// One column of a cube's shape
///
/// Every attribute is read from the dataset on access.
#[derive(Debug, Clone)]
pub struct CubeDimension {
    term: RdfSubject,
    dataset: Dataset,
}

impl CubeDimension {
    pub fn new(term: RdfSubject, dataset: Dataset) -> Self {
        Self { term, dataset }
    }

    pub fn term(&self) -> &RdfSubject {
        &self.term
    }

    fn out(&self, predicate: impl Into<RdfPredicate>) -> Option<RdfObject> {
        self.dataset.object(&self.term, &predicate.into())
    }

    /// `sh:or` alternatives of this property shape
    fn alternatives(&self) -> Vec<RdfSubject> {
        self.out(sh::OR)
            .and_then(|head| self.dataset.list(&head))
            .unwrap_or_default()
            .iter()
            .filter_map(RdfObject::to_subject)
            .collect()
    }

    pub(crate) fn path_term(&self) -> Option<RdfObject> {
        self.out(sh::PATH)
    }

    /// The observation predicate
    pub fn path(&self) -> Option<NamedNode> {
        self.path_term()?.as_named_node().cloned()
    }

    /// `sh:datatype`, or the datatype of the `sh:or` arm that is not
    /// `cube:Undefined`
    pub fn datatype(&self) -> Option<NamedNode> {
        if let Some(RdfObject::NamedNode(datatype)) = self.out(sh::DATATYPE) {
            return Some(datatype);
        }
        self.alternatives().iter().find_map(|alternative| {
            match self.dataset.object(alternative, &sh::DATATYPE.into()) {
                Some(RdfObject::NamedNode(datatype)) if datatype != cube::UNDEFINED => {
                    Some(datatype)
                }
                _ => None,
            }
        })
    }

    /// Whether `cube:Undefined` is an allowed value
    pub fn optional(&self) -> bool {
        let undefined = RdfObject::from(cube::UNDEFINED);
        let in_alternatives = self.alternatives().iter().any(|alternative| {
            self.dataset
                .object(alternative, &sh::DATATYPE.into())
                .as_ref()
                == Some(&undefined)
        });
        let in_values = self
            .out(sh::IN)
            .and_then(|head| self.dataset.list(&head))
            .is_some_and(|values| values.contains(&undefined));
        in_alternatives || in_values
    }

    pub fn min_inclusive(&self) -> Option<RdfObject> {
        self.out(sh::MIN_INCLUSIVE)
    }

    pub fn min_exclusive(&self) -> Option<RdfObject> {
        self.out(sh::MIN_EXCLUSIVE)
    }

    pub fn max_inclusive(&self) -> Option<RdfObject> {
        self.out(sh::MAX_INCLUSIVE)
    }

    pub fn max_exclusive(&self) -> Option<RdfObject> {
        self.out(sh::MAX_EXCLUSIVE)
    }

    /// Enumerated values (`sh:in`) without the `cube:Undefined` marker
    pub fn in_values(&self) -> Option<Vec<RdfObject>> {
        let undefined = RdfObject::from(cube::UNDEFINED);
        let values = self.dataset.list(&self.out(sh::IN)?)?;
        Some(values.into_iter().filter(|v| v != &undefined).collect())
    }

    /// `schema:name` labels
    pub fn names(&self) -> Vec<Literal> {
        self.dataset
            .objects(&self.term, &schema::NAME.into())
            .into_iter()
            .filter_map(|name| name.as_literal().cloned())
            .collect()
    }

    /// The label in `language`, falling back to an untagged label
    pub fn name(&self, language: &str) -> Option<String> {
        let names = self.names();
        names
            .iter()
            .find(|n| n.language() == Some(language))
            .or_else(|| names.iter().find(|n| n.language().is_none()))
            .map(|n| n.value().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::{BlankNode, Quad};

    fn ex(local: &str) -> NamedNode {
        NamedNode::new(&format!("http://example.org/{local}")).unwrap()
    }

    fn xsd(local: &str) -> NamedNode {
        NamedNode::new(&format!("http://www.w3.org/2001/XMLSchema#{local}")).unwrap()
    }

    #[test]
    fn test_plain_property() {
        let dataset = Dataset::new();
        let property = BlankNode::new();
        dataset.insert(Quad::triple(property.clone(), sh::PATH, ex("year")));
        dataset.insert(Quad::triple(property.clone(), sh::DATATYPE, xsd("gYear")));
        dataset.insert(Quad::triple(property.clone(), sh::MIN_INCLUSIVE, Literal::new_integer(2000)));
        dataset.insert(Quad::triple(
            property.clone(),
            schema::NAME,
            Literal::new_language_tagged_literal("Jahr", "de").unwrap(),
        ));
        dataset.insert(Quad::triple(property.clone(), schema::NAME, Literal::new_simple_literal("Year")));

        let dimension = CubeDimension::new(property.into(), dataset);
        assert_eq!(dimension.path(), Some(ex("year")));
        assert_eq!(dimension.datatype(), Some(xsd("gYear")));
        assert!(!dimension.optional());
        assert_eq!(dimension.min_inclusive(), Some(Literal::new_integer(2000).into()));
        assert!(dimension.max_exclusive().is_none());
        assert!(dimension.in_values().is_none());
        assert_eq!(dimension.name("de").as_deref(), Some("Jahr"));
        assert_eq!(dimension.name("fr").as_deref(), Some("Year"));
    }

    #[test]
    fn test_optional_through_or() {
        let dataset = Dataset::new();
        let property = BlankNode::new();
        let defined = BlankNode::new();
        let undefined = BlankNode::new();
        dataset.insert(Quad::triple(defined.clone(), sh::DATATYPE, xsd("decimal")));
        dataset.insert(Quad::triple(undefined.clone(), sh::DATATYPE, cube::UNDEFINED));
        let alternatives = dataset.insert_list(&[undefined.into(), defined.into()], None);
        dataset.insert(Quad::triple(property.clone(), sh::PATH, ex("value")));
        dataset.insert(Quad::triple(property.clone(), sh::OR, alternatives));

        let dimension = CubeDimension::new(property.into(), dataset);
        assert_eq!(dimension.datatype(), Some(xsd("decimal")));
        assert!(dimension.optional());
    }

    #[test]
    fn test_optional_through_in() {
        let dataset = Dataset::new();
        let property = BlankNode::new();
        let values = dataset.insert_list(&[ex("a").into(), cube::UNDEFINED.into()], None);
        dataset.insert(Quad::triple(property.clone(), sh::IN, values));

        let dimension = CubeDimension::new(property.into(), dataset);
        assert!(dimension.optional());
        assert_eq!(dimension.in_values(), Some(vec![ex("a").into()]));
        assert!(dimension.path().is_none());
    }
}
