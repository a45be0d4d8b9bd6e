//! The `flashstudy init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("flashstudy.toml").exists() {
        println!("flashstudy.toml already exists, skipping.");
    } else {
        std::fs::write("flashstudy.toml", SAMPLE_CONFIG)?;
        println!("Created flashstudy.toml");
    }

    std::fs::create_dir_all("datasets")?;
    let example_path = Path::new("datasets/example.toml");
    if example_path.exists() {
        println!("datasets/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_DATASET)?;
        println!("Created datasets/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Add your own cards under datasets/");
    println!("  2. Run: flashstudy validate --dataset datasets");
    println!("  3. Run: flashstudy study");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# flashstudy configuration

# Pause before a match verdict is applied, in milliseconds.
match_delay_ms = 1000

[dataset]
type = "file"
path = "datasets"

# Or fetch subjects from an endpoint:
# type = "http"
# url = "${FLASHSTUDY_DATASET_URL}"

[progress]
type = "local"

# Or keep progress on a server:
# type = "remote"
# url = "https://example.com/progress"
"#;

const EXAMPLE_DATASET: &str = r#"[subjects.geography]
name = "Geography"

[[subjects.geography.flashcards]]
question = "Capital of France"
answer = "Paris"
options = ["Lyon", "Paris", "Marseille"]
hint = "City of light"

[[subjects.geography.flashcards]]
question = "Longest river in Africa"
answer = "Nile"
options = ["Congo", "Niger", "Nile"]

[subjects.rust]
name = "Rust"

[[subjects.rust.flashcards]]
question = "Keyword for an immutable binding"
answer = "let"
options = ["let", "var", "const"]

[[subjects.rust.flashcards]]
question = "Trait the ? operator uses to convert errors"
answer = "From"
options = ["Into", "From", "Try"]
hint = "The counterpart of Into"
"#;
