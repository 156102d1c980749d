use anyhow::Result;

#[cfg(feature = "tflite")]
const LIB: &str = "tensorflowlite_c";

#[cfg(feature = "tflite")]
fn generate_bindings() -> Result<()> {
    use anyhow::{anyhow, Context};
    use std::path::PathBuf;

    let mut bindings = bindgen::Builder::default()
        .header("wrapper.h")
        .parse_callbacks(Box::new(bindgen::CargoCallbacks))
        .allowlist_function("TfLite.*")
        .allowlist_type("TfLite.*")
        .allowlist_var("kTfLite.*")
        .rustfmt_bindings(true)
        .newtype_enum(".+")
        .derive_debug(true)
        .derive_default(true)
        .size_t_is_usize(true)
        .opaque_type("max_align_t");

    if cfg!(feature = "gpu") {
        bindings = bindings.clang_arg("-DTFLITE_ENGINE_GPU");
    }

    if cfg!(feature = "nnapi") {
        bindings = bindings.clang_arg("-DTFLITE_ENGINE_NNAPI");
    }

    // pkg-config first, then an explicit install prefix for source builds
    // that don't ship a .pc file.
    match pkg_config::Config::new().probe(LIB) {
        Ok(library) => {
            for include_path in library.include_paths {
                bindings = bindings.clang_arg(format!("-I{}", include_path.display()));
            }
        }
        Err(error) => {
            let prefix = std::env::var("TFLITE_PREFIX").with_context(|| {
                format!("{} not found by pkg-config ({}) and TFLITE_PREFIX unset", LIB, error)
            })?;
            let prefix = PathBuf::from(prefix);
            bindings = bindings.clang_arg(format!("-I{}", prefix.join("include").display()));
            println!(
                "cargo:rustc-link-search=native={}",
                prefix.join("lib").display()
            );
            println!("cargo:rustc-link-lib=dylib={}", LIB);
        }
    }

    if cfg!(feature = "gpu") {
        println!("cargo:rustc-link-lib=dylib=tensorflowlite_gpu_delegate");
    }

    bindings
        .generate()
        .map_err(|_| anyhow!("unable to generate bindings"))?
        .write_to_file(
            PathBuf::from(
                std::env::var("OUT_DIR").context("OUT_DIR environment variable not defined")?,
            )
            .join("bindings.rs"),
        )
        .context("failed to write bindings to file")?;

    Ok(())
}

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=wrapper.h");
    println!("cargo:rerun-if-env-changed=TFLITE_PREFIX");

    #[cfg(feature = "tflite")]
    generate_bindings()?;

    Ok(())
}
