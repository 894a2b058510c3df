//! Regenerates `include/deskbook.h` from the `extern "C"` surface.

fn main() {
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    let crate_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let config = cbindgen::Config::from_root_or_default(&crate_dir);

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => {
            let include_dir = format!("{crate_dir}/include");
            if let Err(err) = std::fs::create_dir_all(&include_dir) {
                println!("cargo:warning=cannot create {include_dir}: {err}");
                return;
            }
            bindings.write_to_file(format!("{include_dir}/deskbook.h"));
        }
        Err(err) => println!("cargo:warning=header not regenerated: {err}"),
    }
}
