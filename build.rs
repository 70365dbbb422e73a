use std::env;
use std::fs;
use std::path::Path;

// Carga .env (KEY=VALUE) como variables de entorno de compilación,
// para que option_env!("BACKEND_URL") las vea.
fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.env");

    let env_file = Path::new(".env");
    if !env_file.exists() {
        println!("cargo:warning=No hay archivo .env, se usan valores por defecto.");
        return;
    }

    let Ok(contents) = fs::read_to_string(env_file) else {
        return;
    };

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let (key, value) = (key.trim(), value.trim());
            // No pisar variables ya definidas en el entorno
            if env::var(key).is_err() {
                println!("cargo:rustc-env={}={}", key, value);
            }
        }
    }
}
