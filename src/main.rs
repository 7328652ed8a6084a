use cubeview::compiler::QueryOptions;
use cubeview::config::SourceConfig;
use cubeview::model::{ModelResult, Source, View};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let [_, endpoint, cube] = args.as_slice() else {
        eprintln!("usage: cubeview <endpoint> <cube-iri>");
        return ExitCode::FAILURE;
    };

    println!("Cubeview v{}", cubeview::version());
    println!("==========================================");
    println!();

    match run(endpoint, cube).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(endpoint: &str, iri: &str) -> ModelResult<()> {
    let source = Source::new(SourceConfig::new(endpoint))?;

    let Some(cube) = source.cube(iri).await? else {
        println!("Cube {iri} not found at {endpoint}");
        return Ok(());
    };

    println!("=== Cube ===");
    println!("  {}", cube.term());
    if let Some(version) = cube.version() {
        println!("  version: {version}");
    }
    for dimension in cube.dimensions() {
        let name = dimension
            .name("en")
            .or_else(|| dimension.path().map(|p| p.as_str().to_string()))
            .unwrap_or_default();
        println!("  - {name}");
    }

    let view = View::from_cube(&cube, true)?;
    view.set_limit(Some(10));

    let compiled = view.observations_query(QueryOptions::default())?;
    println!("\n=== Query ===");
    println!("{}", compiled.query);

    let count = view.observation_count(QueryOptions::default()).await?;
    println!("\n=== Observations ({}) ===", count.map_or("?".to_string(), |c| c.to_string()));
    for row in view.observations(QueryOptions::default()).await? {
        let row: serde_json::Map<String, serde_json::Value> = row
            .into_iter()
            .map(|(property, term)| (property, term.value().into()))
            .collect();
        println!("  {}", serde_json::Value::Object(row));
    }

    Ok(())
}
