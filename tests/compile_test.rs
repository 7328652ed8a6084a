//! View compilation: golden queries for every operation, aggregate and
//! projection feature

mod common;

use common::*;
use cubeview::compiler::{QueryError, QueryOptions};
use cubeview::config::SourceConfig;
use cubeview::model::{
    Aggregate, DateFunction, Dimension, DimensionOptions, ModelError, OrderBy, Source, View,
};
use cubeview::rdf::{view, BlankNode, Literal, Quad};
use std::sync::Arc;

const INTEGER: &str = "<http://www.w3.org/2001/XMLSchema#integer>";

struct Fixture {
    source: Source,
    view: View,
    year: Dimension,
    value: Dimension,
}

fn fixture() -> Fixture {
    let source = offline_source();
    let cube_source = source.to_cube_source(&ex("cube"));
    let view = View::with_source(&source);
    let year = view
        .create_dimension(DimensionOptions::new(&cube_source, ex("year")))
        .unwrap();
    let value = view
        .create_dimension(DimensionOptions::new(&cube_source, ex("value")))
        .unwrap();
    view.add_dimension(&year);
    view.add_dimension(&value);
    Fixture {
        source,
        view,
        year,
        value,
    }
}

fn aggregated(aggregate: Aggregate) -> Fixture {
    let source = offline_source();
    let cube_source = source.to_cube_source(&ex("cube"));
    let view = View::with_source(&source);
    let year = view
        .create_dimension(DimensionOptions::new(&cube_source, ex("year")))
        .unwrap();
    let value = view
        .create_dimension(DimensionOptions::new(&cube_source, ex("value")).aggregate(aggregate))
        .unwrap();
    view.add_dimension(&year);
    view.add_dimension(&value);
    Fixture {
        source,
        view,
        year,
        value,
    }
}

fn query(view: &View) -> String {
    let query = view.observations_query(QueryOptions::default()).unwrap().query;
    assert_valid(&query);
    query
}

fn integer(value: i64) -> String {
    format!("\"{value}\"^^{INTEGER}")
}

#[test]
fn test_golden_equality_filter() {
    let f = fixture();
    let filter = f.year.filter().eq(2000i64).unwrap();
    f.view.add_filter(&filter).unwrap();

    let compiled = f.view.observations_query(QueryOptions::default()).unwrap();
    let expected = r#"
        SELECT DISTINCT ?dimension0 ?dimension1 WHERE {
          <http://example.org/cube> <https://cube.link/observationSet> ?observationSet0 .
          ?observationSet0 <https://cube.link/observation> ?observation0 .
          ?observation0 <http://example.org/year> ?dimension0 .
          ?observation0 <http://example.org/value> ?dimension1 .
          FILTER (?dimension0 = "2000"^^<http://www.w3.org/2001/XMLSchema#integer>)
        }
    "#;
    assert_eq!(normalize(&compiled.query), normalize(expected));
    assert_valid(&compiled.query);

    let results: Vec<_> = compiled.results().map(|d| d.property.clone()).collect();
    assert_eq!(results, vec![ex("year").into(), ex("value").into()]);
}

#[test]
fn test_golden_pagination_and_count() {
    let f = fixture();
    f.view
        .set_order_by(&[OrderBy::desc(&f.year)])
        .set_offset(Some(5))
        .set_limit(Some(10));

    let compiled = f.view.observations_query(QueryOptions::default()).unwrap();
    let inner = [
        "SELECT DISTINCT ?dimension0 ?dimension1 WHERE {",
        "  <http://example.org/cube> <https://cube.link/observationSet> ?observationSet0 .",
        "  ?observationSet0 <https://cube.link/observation> ?observation0 .",
        "  ?observation0 <http://example.org/year> ?dimension0 .",
        "  ?observation0 <http://example.org/value> ?dimension1 .",
        "}",
    ];
    let mut expected: Vec<String> = inner.iter().map(|l| l.to_string()).collect();
    expected.extend(["ORDER BY DESC(?dimension0)", "OFFSET 5", "LIMIT 10"].map(String::from));
    assert_eq!(compiled.query, expected.join("\n"));

    let mut count = vec!["SELECT (COUNT(*) AS ?count) WHERE {".to_string(), "  {".to_string()];
    count.extend(inner.iter().map(|l| format!("    {l}")));
    count.extend(["  }".to_string(), "}".to_string()]);
    assert_eq!(compiled.count_query, count.join("\n"));
    assert_valid(&compiled.count_query);
}

#[test]
fn test_comparison_operations() {
    for symbol in ["=", "!=", "<", ">", "<=", ">="] {
        let f = fixture();
        let builder = f.year.filter();
        let filter = match symbol {
            "=" => builder.eq(2000i64),
            "!=" => builder.ne(2000i64),
            "<" => builder.lt(2000i64),
            ">" => builder.gt(2000i64),
            "<=" => builder.lte(2000i64),
            _ => builder.gte(2000i64),
        }
        .unwrap();
        f.view.add_filter(&filter).unwrap();

        let query = query(&f.view);
        let expected = format!("FILTER (?dimension0 {symbol} {})", integer(2000));
        assert!(query.contains(&expected), "{symbol}: {query}");
    }
}

#[test]
fn test_in_operation() {
    let f = fixture();
    let filter = f
        .year
        .filter()
        .is_in(vec![2000i64.into(), 2001i64.into()])
        .unwrap();
    f.view.add_filter(&filter).unwrap();

    let query = query(&f.view);
    assert!(query.contains(&format!(
        "FILTER (?dimension0 IN ({}, {}))",
        integer(2000),
        integer(2001)
    )));
}

#[test]
fn test_date_function() {
    let f = fixture();
    let filter = f
        .year
        .filter()
        .gte(Literal::new_typed_literal(
            "2000-01-01",
            cubeview::rdf::NamedNode::new("http://www.w3.org/2001/XMLSchema#date").unwrap(),
        ))
        .unwrap()
        .with_function(DateFunction::Year);
    f.view.add_filter(&filter).unwrap();

    let query = query(&f.view);
    assert!(query.contains("FILTER (YEAR(?dimension0) >= \"2000-01-01\"^^<http://www.w3.org/2001/XMLSchema#date>)"));
}

#[test]
fn test_aggregates() {
    for (aggregate, name) in [
        (Aggregate::Min, "MIN"),
        (Aggregate::Max, "MAX"),
        (Aggregate::Avg, "AVG"),
    ] {
        let f = aggregated(aggregate);
        let query = query(&f.view);
        assert!(query.starts_with(&format!(
            "SELECT DISTINCT ?dimension0 ({name}(?dimension1) AS ?aggregate0) WHERE {{"
        )));
        assert!(query.ends_with("}\nGROUP BY ?dimension0"), "{query}");
    }
}

#[test]
fn test_aggregate_filter_goes_to_having() {
    let f = aggregated(Aggregate::Max);
    let filter = f.value.filter().gt(25i64).unwrap();
    f.view.add_filter(&filter).unwrap();

    let query = query(&f.view);
    assert!(query.ends_with(&format!(
        "GROUP BY ?dimension0\nHAVING (MAX(?dimension1) > {})",
        integer(25)
    )));
    assert!(!query.contains("FILTER"));
}

#[test]
fn test_disable_distinct_flattens_the_query() {
    let f = aggregated(Aggregate::Max);
    let filter = f.value.filter().gt(25i64).unwrap();
    f.view.add_filter(&filter).unwrap();

    let compiled = f
        .view
        .observations_query(QueryOptions {
            disable_distinct: true,
        })
        .unwrap();
    assert_valid(&compiled.query);
    assert!(compiled
        .query
        .starts_with("SELECT ?dimension0 ?dimension1 WHERE {"));
    assert!(compiled
        .query
        .contains(&format!("FILTER (?dimension1 > {})", integer(25))));
    assert!(!compiled.query.contains("GROUP BY"));
    assert!(!compiled.query.contains("HAVING"));
}

#[test]
fn test_columns_order_results() {
    let f = fixture();
    f.view.set_columns(Some(&[f.value.clone(), f.year.clone()]));

    let query = query(&f.view);
    assert!(query.starts_with("SELECT DISTINCT ?dimension1 ?dimension0 WHERE {"));

    f.view.set_columns(Some(&[f.value.clone()]));
    let compiled = f.view.observations_query(QueryOptions::default()).unwrap();
    assert!(compiled.query.starts_with("SELECT DISTINCT ?dimension1 WHERE {"));
    assert_eq!(compiled.results().count(), 1);
    assert_eq!(f.view.columns().unwrap().len(), 1);
}

#[test]
fn test_filter_only_dimension() {
    let f = fixture();
    let cube_source = f.source.to_cube_source(&ex("cube"));
    let place = f
        .view
        .create_dimension(DimensionOptions::new(&cube_source, ex("place")))
        .unwrap();
    let filter = place.filter().eq(ex("bern")).unwrap();
    f.view.add_filter(&filter).unwrap();

    let compiled = f.view.observations_query(QueryOptions::default()).unwrap();
    assert!(compiled
        .query
        .starts_with("SELECT DISTINCT ?dimension0 ?dimension1 WHERE {"));
    assert!(compiled
        .query
        .contains("FILTER (?dimension2 = <http://example.org/bern>)"));

    let place = compiled.dimensions.last().unwrap();
    assert!(place.is_filter);
    assert!(!place.is_result);
}

fn labelled(languages: &[&str]) -> View {
    let source = offline_source();
    let cube_source = source.to_cube_source(&ex("cube"));
    let lookup = source.to_lookup_source();
    let view = View::with_source(&source);

    let place = view
        .create_dimension(DimensionOptions::new(&cube_source, ex("place")))
        .unwrap();
    let label = view
        .create_dimension(
            DimensionOptions::new(&lookup, schema("name"))
                .alias(ex("placeLabel"))
                .join(&place),
        )
        .unwrap();
    view.add_dimension(&place);
    view.add_dimension(&label);
    let filter = label.filter().lang(languages).unwrap();
    view.add_filter(&filter).unwrap();
    view
}

#[test]
fn test_golden_language_fallback() {
    let view = labelled(&["de", ""]);
    let expected = r#"
        SELECT DISTINCT ?dimension0 ?dimension1 WHERE {
          <http://example.org/cube> <https://cube.link/observationSet> ?observationSet0 .
          ?observationSet0 <https://cube.link/observation> ?observation0 .
          ?observation0 <http://example.org/place> ?dimension0 .
          OPTIONAL {
            ?dimension0 <http://schema.org/name> ?language0 .
            FILTER (LANGMATCHES(LANG(?language0), "de"))
          }
          OPTIONAL {
            ?dimension0 <http://schema.org/name> ?language1 .
            FILTER (LANG(?language1) = "")
          }
          BIND (COALESCE(?language0, ?language1) AS ?dimension1)
        }
    "#;
    assert_eq!(normalize(&query(&view)), normalize(expected));
}

#[test]
fn test_any_language_picks_minimum() {
    let view = labelled(&["it", "*"]);
    let query = query(&view);
    assert!(query.contains("OPTIONAL { { SELECT ?dimension0 (MIN(?value0) AS ?language1) WHERE {"));
    assert!(query.contains("} GROUP BY ?dimension0 } }"));
    assert!(query.contains("BIND (COALESCE(?language0, ?language1) AS ?dimension1)"));
}

#[test]
fn test_stardog_text_search() {
    let source = offline_source();
    let cube_source = source.to_cube_source(&ex("cube"));
    let lookup = source.to_lookup_source();
    let view = View::with_source(&source);
    let place = view
        .create_dimension(DimensionOptions::new(&cube_source, ex("place")))
        .unwrap();
    let label = view
        .create_dimension(
            DimensionOptions::new(&lookup, schema("name"))
                .alias(ex("placeLabel"))
                .join(&place),
        )
        .unwrap();
    view.add_dimension(&place);
    view.add_dimension(&label);
    let filter = label.filter().stardog_text_search("Bern").unwrap();
    view.add_filter(&filter).unwrap();

    let query = query(&view);
    assert!(query.contains("?dimension0 <http://schema.org/name> ?dimension1 ."));
    assert!(query.contains(
        "SERVICE <tag:stardog:api:search:textMatch> {\n    [] <tag:stardog:api:search:query> \"Bern\" ;\n      <tag:stardog:api:search:result> ?dimension1 .\n  }"
    ));
}

#[test]
fn test_sequence_path_and_graph() {
    let config = SourceConfig::new(ENDPOINT).with_graph("http://example.org/graph");
    let source = Source::with_client(config, Arc::new(OxigraphClient::empty())).unwrap();
    let cube_source = source.to_cube_source(&ex("cube"));
    let view = View::with_source(&source);
    let name = view
        .create_dimension(
            DimensionOptions::new(&cube_source, vec![ex("place"), schema("name")])
                .alias(ex("placeName")),
        )
        .unwrap();
    view.add_dimension(&name);

    let query = query(&view);
    assert!(query.contains("  GRAPH <http://example.org/graph> {"));
    assert!(query.contains(
        "?observation0 <http://example.org/place>/<http://schema.org/name> ?dimension0 ."
    ));
}

#[test]
fn test_malformed_definitions() {
    let f = fixture();
    let dataset = f.view.dataset();
    let filter = BlankNode::new();
    dataset.insert(Quad::triple(f.view.term().clone(), view::FILTER, filter.clone()));
    dataset.insert(Quad::triple(filter.clone(), view::DIMENSION, f.year.term().clone()));
    dataset.insert(Quad::triple(filter.clone(), view::OPERATION, ex("Like")));
    dataset.insert(Quad::triple(filter.clone(), view::ARGUMENT, Literal::new_integer(1)));

    let err = f.view.observations_query(QueryOptions::default()).unwrap_err();
    match err {
        ModelError::Query(QueryError::UnknownOperation(term)) => {
            assert!(term.contains("http://example.org/Like"))
        }
        other => panic!("unexpected error: {other}"),
    }

    dataset.remove(&Quad::triple(filter.clone(), view::OPERATION, ex("Like")));
    dataset.insert(Quad::triple(filter.clone(), view::OPERATION, view::EQ));
    dataset.insert(Quad::triple(filter, view::FUNCTION, ex("Week")));
    let err = f.view.observations_query(QueryOptions::default()).unwrap_err();
    assert!(matches!(err, ModelError::Query(QueryError::UnknownFunction(_))));

    let g = fixture();
    g.value.node().add(view::AGGREGATE, ex("Median"));
    let err = g.view.observations_query(QueryOptions::default()).unwrap_err();
    assert!(err.to_string().contains("http://example.org/Median"));
}

#[test]
fn test_lookup_without_join() {
    let source = offline_source();
    let view = View::with_source(&source);
    let label = view
        .create_dimension(DimensionOptions::new(&source.to_lookup_source(), schema("name")))
        .unwrap();
    view.add_dimension(&label);

    let err = view.observations_query(QueryOptions::default()).unwrap_err();
    assert!(matches!(err, ModelError::Query(QueryError::MissingJoin(_))));
}

#[test]
fn test_date_functions_in_both_modes() {
    for (function, name) in [
        (DateFunction::Day, "DAY"),
        (DateFunction::Month, "MONTH"),
        (DateFunction::Year, "YEAR"),
    ] {
        let f = fixture();
        let filter = f
            .year
            .filter()
            .lt(Literal::new_typed_literal(
                "2001-06-15",
                cubeview::rdf::NamedNode::new("http://www.w3.org/2001/XMLSchema#date").unwrap(),
            ))
            .unwrap()
            .with_function(function);
        f.view.add_filter(&filter).unwrap();

        let default = query(&f.view);
        let flat = f
            .view
            .observations_query(QueryOptions {
                disable_distinct: true,
            })
            .unwrap()
            .query;
        assert_valid(&flat);

        let expected = format!(
            "FILTER ({name}(?dimension0) < \"2001-06-15\"^^<http://www.w3.org/2001/XMLSchema#date>)"
        );
        assert!(default.contains(&expected), "{default}");
        assert!(flat.contains(&expected), "{flat}");
        assert_eq!(default.replacen("SELECT DISTINCT ", "SELECT ", 1), flat);
    }
}

#[test]
fn test_lookup_through_language_bound_dimension() {
    let source = offline_source();
    let cube_source = source.to_cube_source(&ex("cube"));
    let lookup = source.to_lookup_source();
    let view = View::with_source(&source);

    let place = view
        .create_dimension(DimensionOptions::new(&cube_source, ex("place")))
        .unwrap();
    let label = view
        .create_dimension(
            DimensionOptions::new(&lookup, schema("name"))
                .alias(ex("placeLabel"))
                .join(&place),
        )
        .unwrap();
    let other = view
        .create_dimension(
            DimensionOptions::new(&lookup, schema("alternateName"))
                .alias(ex("otherName"))
                .join(&label),
        )
        .unwrap();
    view.add_dimension(&place);
    view.add_dimension(&label);
    view.add_dimension(&other);
    view.add_filter(&label.filter().lang(&["de"]).unwrap()).unwrap();

    let query = query(&view);
    let bind = query
        .find("BIND (COALESCE(?language0) AS ?dimension1)")
        .unwrap();
    let join = query
        .find("?dimension1 <http://schema.org/alternateName> ?dimension2 .")
        .unwrap();
    assert!(bind < join, "{query}");

    // a language chain joining through another one follows its BIND
    view.clear_filters();
    view.add_filter(&other.filter().lang(&["en"]).unwrap()).unwrap();
    view.add_filter(&label.filter().lang(&["de"]).unwrap()).unwrap();

    let query = self::query(&view);
    let first = query.find("AS ?dimension1)").unwrap();
    let second = query.find("AS ?dimension2)").unwrap();
    assert!(first < second, "{query}");
}

#[test]
fn test_grouped_order_by_needs_result_column() {
    let f = aggregated(Aggregate::Max);
    let cube_source = f.source.to_cube_source(&ex("cube"));
    let place = f
        .view
        .create_dimension(DimensionOptions::new(&cube_source, ex("place")))
        .unwrap();
    f.view.add_filter(&place.filter().ne(ex("bern")).unwrap()).unwrap();
    f.view.set_order_by(&[OrderBy::asc(&place)]);

    let err = f.view.observations_query(QueryOptions::default()).unwrap_err();
    assert!(matches!(err, ModelError::Query(QueryError::UnknownDimension(_))));

    let flat = f
        .view
        .observations_query(QueryOptions {
            disable_distinct: true,
        })
        .unwrap()
        .query;
    assert_valid(&flat);
    assert!(flat.ends_with("ORDER BY ASC(?dimension2)"));

    f.view.set_order_by(&[OrderBy::desc(&f.value), OrderBy::asc(&f.year)]);
    let grouped = query(&f.view);
    assert!(grouped.ends_with("ORDER BY DESC(?aggregate0) ASC(?dimension0)"));
}
