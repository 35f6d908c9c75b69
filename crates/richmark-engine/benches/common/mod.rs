use richmark_engine::models::{Node, parse_markup};

// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
#[allow(dead_code)]
pub fn generate_markup(size: usize) -> String {
    let base = "Plain **bold *nested* text** with `code`, a [link](/x) and $e=mc^2$. ";
    base.repeat(size)
}

#[allow(dead_code)]
pub fn generate_block(size: usize, hints: bool) -> Node {
    parse_markup(&generate_markup(size), hints)
}
