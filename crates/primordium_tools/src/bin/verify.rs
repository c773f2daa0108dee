use clap::Parser;
use primordium_core::species_registry::{RegistryStore as _, SpeciesFilter};
use primordium_io::registry::FileRegistryStore;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a species registry JSON file, as written by `World::persist_registry`.
    #[arg(short, long, default_value = "registry.json")]
    input: String,

    /// Also write the species divergence tree to this path as Graphviz DOT.
    #[arg(long)]
    dot: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("Verifying species registry at {}...", args.input);
    let store = FileRegistryStore::new(&args.input);
    let registry = store.load()?;

    if registry.is_empty() {
        println!("Registry is empty. Nothing to verify.");
        return Ok(());
    }

    let mut violations = Vec::new();
    for record in registry.list(SpeciesFilter::All) {
        if record.extinct && record.population_count != 0 {
            violations.push(format!(
                "{} ({}) is marked extinct but has population {}",
                record.scientific_name, record.species_id, record.population_count
            ));
        }
        if record.population_count > record.max_population {
            violations.push(format!(
                "{} ({}) population {} exceeds recorded max_population {}",
                record.scientific_name, record.species_id, record.population_count, record.max_population
            ));
        }
        if record.generation > record.max_generation {
            violations.push(format!(
                "{} ({}) generation {} exceeds recorded max_generation {}",
                record.scientific_name, record.species_id, record.generation, record.max_generation
            ));
        }
        if let Some(parent_id) = record.parent_species_id {
            if registry.get(parent_id).is_none() {
                violations.push(format!(
                    "{} ({}) references missing parent species {}",
                    record.scientific_name, record.species_id, parent_id
                ));
            }
        }
    }

    if violations.is_empty() {
        println!(
            "\n✅ VERIFICATION SUCCESSFUL! {} species checked, no invariant violations.",
            registry.len()
        );
    } else {
        println!("\n❌ VERIFICATION FAILED! {} violation(s):", violations.len());
        for violation in &violations {
            println!("  - {violation}");
        }
    }

    if let Some(dot_path) = &args.dot {
        let tree = primordium_io::lineage::SpeciesTree::build(&registry);
        std::fs::write(dot_path, tree.to_dot())?;
        println!("\nWrote species tree to {dot_path}");
    }

    if !violations.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_args_parsing_defaults() {
        let args = Args::parse_from(["verify"]);
        assert_eq!(args.input, "registry.json");
        assert_eq!(args.dot, None);
    }

    #[test]
    fn test_args_parsing_custom() {
        let args = Args::parse_from(["verify", "-i", "my_registry.json", "--dot", "tree.dot"]);
        assert_eq!(args.input, "my_registry.json");
        assert_eq!(args.dot, Some("tree.dot".to_string()));
    }
}
