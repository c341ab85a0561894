// Build-Script: Zugangsdaten aus .env einbacken und Linker für ESP32-C6 konfigurieren

/// Variablen, die `config.rs` per `env!` zur Compile-Zeit liest
const BUILD_ENV: [&str; 4] = ["WIFI_SSID", "WIFI_PASSWORD", "MQTT_BROKER", "MQTT_CLIENT_ID"];

fn main() {
    // Ohne .env müssen die Variablen in der Umgebung gesetzt sein
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("⚠️  .env file nicht gefunden: {}", e);
        eprintln!("   Setze {} als Environment-Variablen", BUILD_ENV.join(", "));
        eprintln!("   (Vorlage: .env.example)");
    }

    for name in BUILD_ENV {
        println!("cargo:rerun-if-env-changed={}", name);
        match std::env::var(name) {
            Ok(value) => println!("cargo:rustc-env={}={}", name, value),
            Err(_) => println!("cargo:warning={} fehlt, der Build bricht bei env!() ab", name),
        }
    }
    println!("cargo:rerun-if-changed=../.env");

    linker_hints();

    // defmt.x: Symbole für das binäre Log-Format
    println!("cargo:rustc-link-arg=-Tdefmt.x");
    // linkall.x: Flash/RAM-Layout, muss als letztes Skript kommen
    println!("cargo:rustc-link-arg=-Tlinkall.x");
}

/// Tipps bei Linker-Fehlern
///
/// Der Linker ruft dieses Build-Script als `--error-handling-script` mit
/// Fehler-Typ und Symbol-Name erneut auf.
fn linker_hints() {
    let args: Vec<String> = std::env::args().collect();

    if let [_, kind, what, ..] = args.as_slice() {
        if kind != "undefined-symbol" {
            std::process::exit(1);
        }
        if let Some(hint) = hint_for_symbol(what) {
            eprintln!();
            eprintln!("💡 {}", hint);
            eprintln!();
        }
        std::process::exit(0);
    }

    if let Ok(exe) = std::env::current_exe() {
        println!("cargo:rustc-link-arg=--error-handling-script={}", exe.display());
    }
}

fn hint_for_symbol(symbol: &str) -> Option<&'static str> {
    match symbol {
        s if s.starts_with("_defmt_") => {
            Some("`defmt` not found - is `defmt.x` added as a linker script?")
        }
        "_stack_start" => Some("Is the linker script `linkall.x` missing?"),
        s if s.starts_with("esp_rtos_") => {
            Some("`esp-radio` has no scheduler: call `esp_rtos::start` before initializing Wi-Fi")
        }
        "free" | "malloc" | "calloc" | "malloc_internal" | "free_internal"
        | "get_free_internal_heap_size" => {
            Some("Heap symbols missing: is `esp-alloc` a dependency and the heap initialized?")
        }
        _ => None,
    }
}
