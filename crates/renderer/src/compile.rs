//! GLSL wrapping and stage compilation.
//!
//! Catalog shaders supply only a fragment body declaring
//! `mainImage(out vec4 fragColor, in vec2 fragCoord)`. Before compilation the
//! body is wrapped: a header injects the frame uniform block (`u_resolution`,
//! `u_mouse`, `u_time`) and a per-shader parameter block generated from the
//! descriptors, and a footer remaps `gl_FragCoord` to a bottom-left origin
//! and delegates to `mainImage`. Any `#version` directive or user declaration
//! of an injected uniform is stripped so the generated blocks win.

use std::borrow::Cow;

use catalog::{ParameterKind, ShaderDefinition};
use wgpu::naga::ShaderStage;

/// Uniform names owned by the renderer; shaders may reference but not declare them.
const RESERVED_UNIFORMS: [&str; 3] = ["u_resolution", "u_mouse", "u_time"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    fn stage(self) -> ShaderStage {
        match self {
            StageKind::Vertex => ShaderStage::Vertex,
            StageKind::Fragment => ShaderStage::Fragment,
        }
    }

    fn label(self) -> &'static str {
        match self {
            StageKind::Vertex => "quad vertex stage",
            StageKind::Fragment => "gallery fragment stage",
        }
    }
}

/// Compiles one stage from GLSL source.
///
/// Errors are returned as the compiler's diagnostic text; the caller tags
/// them with the failing stage. The module creation runs inside a validation
/// error scope so a bad shader is reported here instead of poisoning the
/// device later.
pub(crate) fn compile_stage(
    device: &wgpu::Device,
    kind: StageKind,
    source: &str,
) -> Result<wgpu::ShaderModule, String> {
    if source.trim().is_empty() {
        return Err("shader source is empty".to_string());
    }

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(kind.label()),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(source),
            stage: kind.stage(),
            defines: &[],
        },
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(error) => Err(error.to_string()),
        None => Ok(module),
    }
}

/// Produces a self-contained GLSL fragment shader from a catalog body.
pub(crate) fn wrap_fragment(definition: &ShaderDefinition) -> String {
    let sanitized = sanitize_body(definition);
    let parameter_block = parameter_block(definition);
    format!("{HEADER}{parameter_block}\n#line 1\n{sanitized}{FOOTER}")
}

/// Drops `#version` directives and declarations of injected uniforms so the
/// generated header remains the single source of truth for them.
fn sanitize_body(definition: &ShaderDefinition) -> String {
    let mut sanitized = String::with_capacity(definition.source.len());
    let mut skipped_version = false;
    for line in definition.source.lines() {
        let trimmed = line.trim_start();
        if !skipped_version && trimmed.starts_with("#version") {
            skipped_version = true;
            continue;
        }
        if trimmed.starts_with("uniform ") && declares_injected_uniform(trimmed, definition) {
            continue;
        }
        sanitized.push_str(line);
        sanitized.push('\n');
    }
    sanitized
}

fn declares_injected_uniform(line: &str, definition: &ShaderDefinition) -> bool {
    RESERVED_UNIFORMS
        .iter()
        .copied()
        .chain(definition.parameters.iter().map(|p| p.name.as_str()))
        .any(|name| contains_identifier(line, name))
}

/// Exact-token match: `u_speed` must not match inside `u_speed_factor`.
fn contains_identifier(line: &str, name: &str) -> bool {
    line.split(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
        .any(|token| token == name)
}

/// Generates the std140 parameter block matching the packed uniform buffer:
/// one 4-byte scalar per descriptor, in declaration order. Empty when the
/// shader declares no parameters.
fn parameter_block(definition: &ShaderDefinition) -> String {
    if definition.parameters.is_empty() {
        return String::new();
    }
    let mut block = String::from("layout(std140, set = 0, binding = 1) uniform ShaderParams {\n");
    for parameter in &definition.parameters {
        let glsl_type = match parameter.kind {
            ParameterKind::Float => "float",
            ParameterKind::Int => "int",
        };
        block.push_str(&format!("    {glsl_type} {};\n", parameter.name));
    }
    block.push_str("};\n");
    block
}

/// GLSL prologue: frame uniforms shared by every shader. The block layout
/// must match `FrameUniforms` in `gpu/uniforms.rs`.
const HEADER: &str = r"#version 450
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform FrameUniforms {
    vec2 u_resolution;
    vec2 u_mouse;
    float u_time;
};

";

/// GLSL epilogue: flip to a bottom-left origin and call `mainImage`.
const FOOTER: &str = r"
void main() {
    vec2 fragCoord = vec2(gl_FragCoord.x, u_resolution.y - gl_FragCoord.y);
    vec4 color = vec4(0.0);
    mainImage(color, fragCoord);
    outColor = vec4(color.rgb, 1.0);
}
";

/// Minimal vertex stage for the full-screen quad: one vec2 position
/// attribute at location 0, passed straight through to clip space.
pub(crate) const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 position;

void main() {
    gl_Position = vec4(position, 0.0, 1.0);
}
";

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::ParameterDescriptor;

    fn definition(parameters: Vec<ParameterDescriptor>, source: &str) -> ShaderDefinition {
        ShaderDefinition {
            id: "test".to_string(),
            name: "Test".to_string(),
            source: source.to_string(),
            parameters,
        }
    }

    #[test]
    fn wrap_strips_version_and_declared_uniforms() {
        let source = r#"
#version 300 es
uniform float u_speed;
uniform float u_time;
void mainImage(out vec4 fragColor, in vec2 fragCoord) {
    fragColor = vec4(fract(u_time * u_speed));
}
"#;
        let wrapped = wrap_fragment(&definition(
            vec![ParameterDescriptor::float("u_speed", "Speed", 0.0, 2.0, 0.1, 1.0)],
            source,
        ));
        assert!(!wrapped.contains("#version 300 es"));
        assert!(!wrapped.contains("uniform float u_speed"));
        assert!(!wrapped.contains("uniform float u_time"));
        // Exactly one #version directive, the injected one.
        assert_eq!(wrapped.matches("#version").count(), 1);
        assert!(wrapped.starts_with("#version 450"));
        assert!(wrapped.contains("mainImage"));
    }

    #[test]
    fn wrap_generates_parameter_block_in_order() {
        let wrapped = wrap_fragment(&definition(
            vec![
                ParameterDescriptor::int("u_octaves", "Octaves", 1.0, 8.0, 1.0, 4.0),
                ParameterDescriptor::float("u_zoom", "Zoom", 1.0, 16.0, 0.5, 4.0),
            ],
            "void mainImage(out vec4 c, in vec2 f) { c = vec4(u_zoom / float(u_octaves)); }",
        ));
        let octaves = wrapped.find("int u_octaves;").expect("octaves declared");
        let zoom = wrapped.find("float u_zoom;").expect("zoom declared");
        assert!(octaves < zoom, "declaration order must match descriptors");
        assert!(wrapped.contains("binding = 1"));
    }

    #[test]
    fn wrap_omits_parameter_block_without_parameters() {
        let wrapped = wrap_fragment(&definition(
            vec![],
            "void mainImage(out vec4 c, in vec2 f) { c = vec4(1.0); }",
        ));
        assert!(!wrapped.contains("ShaderParams"));
        assert!(!wrapped.contains("binding = 1"));
        assert!(wrapped.contains("binding = 0"));
    }

    #[test]
    fn footer_flips_to_bottom_left_origin() {
        let wrapped = wrap_fragment(&definition(
            vec![],
            "void mainImage(out vec4 c, in vec2 f) { c = vec4(1.0); }",
        ));
        assert!(wrapped.contains("u_resolution.y - gl_FragCoord.y"));
    }

    #[test]
    fn stripping_requires_an_exact_identifier_match() {
        let source = r#"
uniform float u_speed;
uniform float u_speed_factor;
void mainImage(out vec4 fragColor, in vec2 fragCoord) {
    fragColor = vec4(u_speed * u_speed_factor);
}
"#;
        let wrapped = wrap_fragment(&definition(
            vec![ParameterDescriptor::float("u_speed", "Speed", 0.0, 2.0, 0.1, 1.0)],
            source,
        ));
        // The declared parameter is stripped; the longer-named user uniform
        // stays untouched.
        assert!(!wrapped.contains("uniform float u_speed;"));
        assert!(wrapped.contains("uniform float u_speed_factor;"));
    }

    fn parse_glsl(stage: ShaderStage, source: &str) -> Result<(), String> {
        let mut frontend = wgpu::naga::front::glsl::Frontend::default();
        frontend
            .parse(&wgpu::naga::front::glsl::Options::from(stage), source)
            .map(|_| ())
            .map_err(|errors| errors.to_string())
    }

    #[test]
    fn wrapped_builtin_shaders_parse_as_glsl() {
        for shader in catalog::Catalog::builtin().shaders() {
            let wrapped = wrap_fragment(shader);
            if let Err(diagnostic) = parse_glsl(ShaderStage::Fragment, &wrapped) {
                panic!("shader `{}` failed to parse: {diagnostic}", shader.id);
            }
        }
    }

    #[test]
    fn vertex_stage_parses_as_glsl() {
        parse_glsl(ShaderStage::Vertex, VERTEX_SHADER_GLSL).expect("vertex stage parses");
    }

    #[test]
    fn broken_fragment_source_fails_to_parse() {
        let wrapped = wrap_fragment(&definition(
            vec![],
            "void mainImage(out vec4 c, in vec2 f) { c = vec4(1.0; }",
        ));
        assert!(parse_glsl(ShaderStage::Fragment, &wrapped).is_err());
    }
}
