//! Server-rendered HTML for the dashboard (`/`) and agent console (`/test-as`).

use std::fmt::Write;

use crate::catalog::{EngineSummary, ReasoningEngineSummary};

/// Everything the dashboard shows. Each section fails independently.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub project: Result<String, String>,
    pub discovery_engine_location: String,
    pub discovery_engine_collection: String,
    pub engines: Result<Vec<EngineSummary>, String>,
    pub reasoning_engine_location: String,
    pub reasoning_engines: Result<Vec<ReasoningEngineSummary>, String>,
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 2rem; color: #202124; }
h1 { font-size: 1.5rem; }
h2 { font-size: 1.15rem; margin-top: 2rem; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #dadce0; padding: 0.4rem 0.6rem; text-align: left; font-size: 0.9rem; }
th { background: #f1f3f4; }
.error { color: #b3261e; background: #fce8e6; padding: 0.6rem; border-radius: 4px; }
.muted { color: #5f6368; }
code { background: #f1f3f4; padding: 0 0.2rem; }
form { margin: 1rem 0; padding: 1rem; border: 1px solid #dadce0; border-radius: 4px; }
label { display: inline-block; min-width: 10rem; }
input { margin: 0.2rem 0; width: 22rem; }
pre { background: #f8f9fa; padding: 1rem; overflow-x: auto; }
"#;

/// Escape HTML entities
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n",
        title = html_escape(title),
    )
}

fn error_block(out: &mut String, message: &str) {
    let _ = writeln!(out, "<p class=\"error\">{}</p>", html_escape(message));
}

pub fn render_index(view: &DashboardView) -> String {
    let mut body = String::new();
    body.push_str("<h1>Agentspace Registry</h1>\n");
    body.push_str("<p><a href=\"/test-as\">Open agent console</a></p>\n");

    match &view.project {
        Ok(project) => {
            let _ = writeln!(
                body,
                "<p>GCP project: <code>{}</code></p>",
                html_escape(project)
            );
        }
        Err(message) => error_block(&mut body, message),
    }

    let _ = writeln!(
        body,
        "<h2>Agentspace apps</h2>\n<p class=\"muted\">Location <code>{}</code>, collection <code>{}</code></p>",
        html_escape(&view.discovery_engine_location),
        html_escape(&view.discovery_engine_collection),
    );
    match &view.engines {
        Ok(engines) if engines.is_empty() => {
            body.push_str("<p class=\"muted\">No apps found.</p>\n");
        }
        Ok(engines) => {
            body.push_str(
                "<table>\n<tr><th>Display name</th><th>App id</th><th>Solution type</th></tr>\n",
            );
            for engine in engines {
                let _ = writeln!(
                    body,
                    "<tr><td>{}</td><td><code>{}</code></td><td>{}</td></tr>",
                    html_escape(&engine.display_name),
                    html_escape(engine.id()),
                    html_escape(&engine.solution_type),
                );
            }
            body.push_str("</table>\n");
        }
        Err(message) => error_block(&mut body, message),
    }

    let _ = writeln!(
        body,
        "<h2>Reasoning engines</h2>\n<p class=\"muted\">Location <code>{}</code></p>",
        html_escape(&view.reasoning_engine_location),
    );
    match &view.reasoning_engines {
        Ok(engines) if engines.is_empty() => {
            body.push_str("<p class=\"muted\">No reasoning engines found.</p>\n");
        }
        Ok(engines) => {
            body.push_str(
                "<table>\n<tr><th>Display name</th><th>Id</th><th>Resource</th><th>Created</th><th>Updated</th></tr>\n",
            );
            for engine in engines {
                let _ = writeln!(
                    body,
                    "<tr><td>{}</td><td><code>{}</code></td><td><code>{}</code></td><td>{}</td><td>{}</td></tr>",
                    html_escape(&engine.display_name),
                    html_escape(&engine.name),
                    html_escape(&engine.resource_name),
                    html_escape(&engine.create_time),
                    html_escape(&engine.update_time),
                );
            }
            body.push_str("</table>\n");
        }
        Err(message) => error_block(&mut body, message),
    }

    page("Agentspace Registry", &body)
}

const CONSOLE_BODY: &str = r#"<h1>Agent console</h1>
<p><a href="/">Back to dashboard</a></p>

<form id="scope">
  <label>Project id</label><input name="project_id"><br>
  <label>App id</label><input name="app_id">
</form>

<form data-method="GET" data-path="/api/as-agents/list-agents">
  <h2>List agents</h2>
  <button>List</button>
</form>

<form data-method="GET" data-path="/api/as-agents/get-agent">
  <h2>Get agent</h2>
  <label>Agent id</label><input name="agent_id"><br>
  <button>Get</button>
</form>

<form data-method="GET" data-path="/api/as-agents/get-agent-by-name">
  <h2>Find by display name</h2>
  <label>Display name</label><input name="display_name"><br>
  <button>Find</button>
</form>

<form data-method="POST" data-path="/api/as-agents/add-agent">
  <h2>Create agent</h2>
  <label>Display name</label><input name="display_name"><br>
  <label>Description</label><input name="description"><br>
  <label>Tool description</label><input name="tool_description"><br>
  <label>ADK deployment id</label><input name="adk_deployment_id"><br>
  <label>Authorization id</label><input name="auth_id"><br>
  <label>Icon URI</label><input name="icon_uri"><br>
  <button>Create</button>
</form>

<form data-method="PUT" data-path="/api/as-agents/update-agent">
  <h2>Update agent</h2>
  <p class="muted">Empty fields keep their current value.</p>
  <label>Agent id</label><input name="agent_id"><br>
  <label>Display name</label><input name="display_name"><br>
  <label>Description</label><input name="description"><br>
  <label>Tool description</label><input name="tool_description"><br>
  <label>Reasoning engine</label><input name="adk_deployment_id"><br>
  <label>Authorization</label><input name="auth_id"><br>
  <label>Icon URI</label><input name="icon_uri"><br>
  <button>Update</button>
</form>

<form data-method="DELETE" data-path="/api/as-agents/delete-agent">
  <h2>Delete agent</h2>
  <label>Agent id</label><input name="agent_id"><br>
  <button>Delete</button>
</form>

<h2>Response</h2>
<pre id="output"></pre>

<script>
const output = document.getElementById('output');
const scope = document.getElementById('scope');

function fields(form) {
  const values = {};
  for (const [key, value] of new FormData(scope)) values[key] = value;
  for (const [key, value] of new FormData(form)) {
    if (value !== '') values[key] = value;
  }
  return values;
}

document.querySelectorAll('form[data-path]').forEach((form) => {
  form.addEventListener('submit', async (event) => {
    event.preventDefault();
    const method = form.dataset.method;
    const values = fields(form);
    let url = form.dataset.path;
    const init = { method, headers: {} };
    if (method === 'GET' || method === 'DELETE') {
      url += '?' + new URLSearchParams(values).toString();
    } else {
      init.headers['Content-Type'] = 'application/json';
      init.body = JSON.stringify(values);
    }
    output.textContent = method + ' ' + url + ' ...';
    try {
      const response = await fetch(url, init);
      const text = await response.text();
      let shown = text;
      try { shown = JSON.stringify(JSON.parse(text), null, 2); } catch (_) {}
      output.textContent = response.status + '\n' + shown;
    } catch (err) {
      output.textContent = String(err);
    }
  });
});
</script>
"#;

pub fn render_console() -> String {
    page("Agent console", CONSOLE_BODY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> DashboardView {
        DashboardView {
            project: Ok("my-project".to_string()),
            discovery_engine_location: "global".to_string(),
            discovery_engine_collection: "default_collection".to_string(),
            engines: Ok(vec![EngineSummary {
                name: "projects/1/locations/global/collections/default_collection/engines/app-1"
                    .to_string(),
                display_name: "<Support> & Sales".to_string(),
                solution_type: "SOLUTION_TYPE_SEARCH".to_string(),
                project_id: None,
            }]),
            reasoning_engine_location: "us-central1".to_string(),
            reasoning_engines: Ok(vec![]),
        }
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_index_escapes_engine_names() {
        let html = render_index(&view());
        assert!(html.contains("&lt;Support&gt; &amp; Sales"));
        assert!(!html.contains("<Support>"));
        assert!(html.contains("<code>app-1</code>"));
        assert!(html.contains("No reasoning engines found."));
    }

    #[test]
    fn test_index_sections_fail_independently() {
        let mut view = view();
        view.project = Err("Could not determine GCP project id".to_string());
        view.reasoning_engines = Err("Permission denied listing Reasoning Engines".to_string());
        let html = render_index(&view);
        assert!(html.contains("class=\"error\">Could not determine GCP project id"));
        assert!(html.contains("Permission denied listing Reasoning Engines"));
        assert!(html.contains("SOLUTION_TYPE_SEARCH"));
    }

    #[test]
    fn test_console_targets_api_routes() {
        let html = render_console();
        for path in [
            "/api/as-agents/list-agents",
            "/api/as-agents/add-agent",
            "/api/as-agents/update-agent",
            "/api/as-agents/delete-agent",
            "/api/as-agents/get-agent-by-name",
        ] {
            assert!(html.contains(path), "missing {path}");
        }
    }
}
