pub mod imgui_renderer;
pub mod line_pass;
pub mod lines;
pub mod mesh_pass;
pub mod pass;
pub mod render_common;
pub mod renderer;
pub mod screenshot;
pub mod shader_loader;
pub mod texture;
