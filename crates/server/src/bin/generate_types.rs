//! Run with: cargo run --package server --bin generate-types --features typescript

use std::fs;
use std::path::Path;

fn main() {
    let out_dir = Path::new("clients/types/generated");

    if let Err(e) = fs::create_dir_all(out_dir) {
        eprintln!("Failed to create output directory: {}", e);
        std::process::exit(1);
    }

    #[cfg(feature = "typescript")]
    {
        use ts_rs::TS;

        println!("Generating TypeScript types...");

        let exported = [
            shipyard_core::DeploymentRequest::export_all_to(out_dir),
            events::EventKind::export_all_to(out_dir),
            events::ProgressEvent::export_all_to(out_dir),
        ];

        for result in exported {
            if let Err(e) = result {
                eprintln!("Failed to export type: {}", e);
                std::process::exit(1);
            }
        }

        println!("Types exported to {}", out_dir.display());

        if let Err(e) = generate_index(out_dir) {
            eprintln!("Failed to write index.ts: {}", e);
            std::process::exit(1);
        }
    }

    #[cfg(not(feature = "typescript"))]
    {
        eprintln!("Error: typescript feature is not enabled");
        eprintln!("Run with: cargo run --package server --bin generate-types --features typescript");
        std::process::exit(1);
    }
}

#[cfg(feature = "typescript")]
fn generate_index(out_dir: &Path) -> std::io::Result<()> {
    let index_path = out_dir.join("index.ts");

    let exports = r#"// Auto-generated - regenerate with: cargo run --package server --bin generate-types --features typescript

export * from './DeploymentRequest';
export * from './EventKind';
export * from './ProgressEvent';
"#;

    fs::write(&index_path, exports)?;
    println!("Generated {}", index_path.display());
    Ok(())
}
