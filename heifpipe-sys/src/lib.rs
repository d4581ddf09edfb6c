//! Raw FFI bindings to [libheif](https://github.com/strukturag/libheif), generated by
//! `bindgen` at build time. See the `heifpipe` crate for safe wrappers.
#![allow(non_camel_case_types, non_snake_case, non_upper_case_globals)]
#![allow(clippy::all)]

include!(concat!(env!("OUT_DIR"), "/bindings.rs"));
