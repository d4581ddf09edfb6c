use std::env;
use std::path::{Path, PathBuf};

/// Enums we hand to or read back from libheif; everything else stays a plain integer.
const RUSTIFIED_ENUMS: &str =
    "heif_(error_code|suberror_code|colorspace|chroma|channel|compression_format)";

fn locate_src_dir(manifest_dir: &Path) -> PathBuf {
    if let Ok(env) = env::var("LIBHEIF_SRC_DIR") {
        return PathBuf::from(env);
    }

    let workspace_root = manifest_dir
        .parent()
        .expect("heifpipe-sys has no parent dir");

    let submodule_path = workspace_root.join("libheif");
    if submodule_path.join("CMakeLists.txt").is_file() {
        return submodule_path;
    }

    // Fallback: sibling checkout.
    workspace_root
        .parent()
        .expect("workspace has no parent dir")
        .join("libheif")
}

/// Builds libheif from source and returns the include directory of the install tree.
fn build_vendored(manifest_dir: &Path) -> Vec<PathBuf> {
    let src_dir = locate_src_dir(manifest_dir);
    if !src_dir.join("CMakeLists.txt").is_file() {
        panic!(
            "Could not find libheif sources; set LIBHEIF_SRC_DIR (current: {})",
            src_dir.display()
        );
    }

    let target_env = env::var("CARGO_CFG_TARGET_ENV").unwrap_or_default();
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let build_shared = cfg!(feature = "shared");

    let mut cfg = cmake::Config::new(&src_dir);
    cfg.profile("Release");
    cfg.define("BUILD_SHARED_LIBS", if build_shared { "ON" } else { "OFF" });
    cfg.define("BUILD_TESTING", "OFF");
    cfg.define("WITH_EXAMPLES", "OFF");
    cfg.define("WITH_GDK_PIXBUF", "OFF");
    cfg.define("ENABLE_PLUGIN_LOADING", "OFF");
    cfg.define("WITH_LIBDE265", "ON");
    cfg.define("WITH_X265", "ON");
    cfg.define("WITH_AOM_DECODER", "OFF");
    cfg.define("WITH_AOM_ENCODER", "OFF");
    cfg.define("WITH_DAV1D", "OFF");
    cfg.define("WITH_RAV1E", "OFF");
    cfg.define("WITH_SvtEnc", "OFF");
    let dst = cfg.build();

    println!("cargo:rustc-link-search=native={}/lib", dst.display());
    println!("cargo:rustc-link-search=native={}/lib64", dst.display());
    let link_kind = if build_shared { "dylib" } else { "static" };
    println!("cargo:rustc-link-lib={}=heif", link_kind);
    if !build_shared {
        // Static libheif pulls in its codec backends and the C++ runtime.
        println!("cargo:rustc-link-lib=de265");
        println!("cargo:rustc-link-lib=x265");
        if target_env != "msvc" {
            let cxx_stdlib = if target_os == "macos" {
                "c++"
            } else {
                "stdc++"
            };
            println!("cargo:rustc-link-lib={}", cxx_stdlib);
        }
    }
    println!(
        "cargo:rerun-if-changed={}",
        src_dir.join("libheif/api/libheif/heif.h").display()
    );

    vec![dst.join("include")]
}

/// Finds the system libheif and returns its include directories.
fn probe_system() -> Vec<PathBuf> {
    if env::var_os("LIBHEIF_NO_PKG_CONFIG").is_none() {
        match pkg_config::Config::new()
            .atleast_version("1.16")
            .probe("libheif")
        {
            Ok(lib) => return lib.include_paths,
            Err(err) => {
                println!("cargo:warning=pkg-config could not find libheif: {}", err);
            }
        }
    }

    if let Ok(lib_dir) = env::var("LIBHEIF_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", lib_dir);
    }
    println!("cargo:rustc-link-lib=heif");
    env::var("LIBHEIF_INCLUDE_DIR")
        .map(|dir| vec![PathBuf::from(dir)])
        .unwrap_or_default()
}

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR"));
    println!("cargo:rerun-if-env-changed=LIBHEIF_SRC_DIR");
    println!("cargo:rerun-if-env-changed=LIBHEIF_NO_PKG_CONFIG");
    println!("cargo:rerun-if-env-changed=LIBHEIF_INCLUDE_DIR");
    println!("cargo:rerun-if-env-changed=LIBHEIF_LIB_DIR");

    let include_dirs = if cfg!(feature = "vendored") {
        build_vendored(&manifest_dir)
    } else {
        probe_system()
    };

    let target = env::var("TARGET").expect("TARGET");
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR"));

    let mut bindings = bindgen::Builder::default()
        .header_contents("wrapper.h", "#include <libheif/heif.h>\n")
        .rustified_enum(RUSTIFIED_ENUMS)
        .allowlist_function("heif_.*")
        .allowlist_type("heif_.*")
        .allowlist_var("(LIBHEIF|heif)_.*")
        .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()))
        .layout_tests(false)
        .clang_arg(format!("--target={}", target));
    for dir in &include_dirs {
        bindings = bindings.clang_arg(format!("-I{}", dir.display()));
    }
    let bindings = bindings.generate().expect("bindgen failed");

    bindings
        .write_to_file(out_dir.join("bindings.rs"))
        .expect("failed to write bindings");
}
