//! Per-route rendering.

use std::path::Path;

use tera::{Context, Tera};

use super::{RenderError, load_templates};
use crate::page::{PageRoute, RouteTable};
use crate::utils::write::{WriteOutcome, write_if_changed};

/// Pages handled by one render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Pages whose file changed on disk
    pub written: usize,
    /// Pages whose output was already identical
    pub unchanged: usize,
}

/// Render every route of `routes` into `output_dir`, in table order.
///
/// Stops at the first failing route; pages rendered before it stay on disk.
pub fn render(
    template_dir: &Path,
    routes: &RouteTable,
    output_dir: &Path,
) -> Result<RenderReport, RenderError> {
    let tera = load_templates(template_dir)?;
    let mut report = RenderReport::default();

    for route in routes.iter() {
        let html = render_route(&tera, template_dir, route)?;
        let path = route.output_file(output_dir);

        let outcome = write_if_changed(&path, html.as_bytes())
            .map_err(|source| RenderError::Io { path, source })?;
        match outcome {
            WriteOutcome::Written => report.written += 1,
            WriteOutcome::Unchanged => report.unchanged += 1,
        }
    }

    Ok(report)
}

fn render_route(tera: &Tera, template_dir: &Path, route: &PageRoute) -> Result<String, RenderError> {
    if !tera.get_template_names().any(|name| name == route.template) {
        return Err(RenderError::TemplateNotFound {
            name: route.template.clone(),
            dir: template_dir.to_path_buf(),
        });
    }

    let mut context = Context::new();
    context.insert("path", &route.path);

    tera.render(&route.template, &context)
        .map_err(|source| RenderError::Template {
            name: route.template.clone(),
            source,
        })
}
