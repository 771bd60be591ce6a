#![allow(unused_crate_dependencies)]

use candidate_graph_canvas::{App, init_logging};

fn main() {
	init_logging();
	leptos::mount::mount_to_body(App)
}
