// =============================================================================
// Embedded Dashboard — single-page forecast view
// =============================================================================
//
// Served at `/`. Pure static HTML + fetch JS against the JSON API, so the
// binary ships self-contained with no asset pipeline. The threshold and
// simulation controls re-query `/api/v1/forecast` with query overrides and
// never persist anything.

use axum::response::Html;

pub async fn index() -> Html<&'static str> {
    Html(PAGE)
}

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Horizon Forecast</title>
<style>
  body { font-family: ui-monospace, Menlo, Consolas, monospace; background: #0d1117;
         color: #c9d1d9; margin: 2rem auto; max-width: 860px; padding: 0 1rem; }
  h1 { color: #58a6ff; font-size: 1.4rem; }
  h2 { color: #8b949e; font-size: 1.05rem; margin-top: 1.6rem; }
  table { border-collapse: collapse; margin-top: 0.5rem; }
  th, td { border: 1px solid #30363d; padding: 0.3rem 0.8rem; text-align: right; }
  th { color: #8b949e; }
  .state { text-transform: uppercase; font-weight: bold; }
  .state.up { color: #3fb950; }
  .state.down { color: #f85149; }
  .state.flat { color: #d29922; }
  .error { color: #f85149; white-space: pre-wrap; }
  .meta { color: #8b949e; font-size: 0.85rem; }
  form { margin-top: 1rem; }
  input { background: #161b22; color: #c9d1d9; border: 1px solid #30363d;
          width: 6.5rem; padding: 0.2rem 0.4rem; }
  button { background: #238636; color: #fff; border: 0; padding: 0.3rem 1rem;
           cursor: pointer; }
</style>
</head>
<body>
<h1>Horizon Forecast</h1>
<div id="meta" class="meta"></div>
<div id="error" class="error"></div>

<h2>Next day</h2>
<div id="next"></div>
<table id="probs"></table>

<h2>Transition matrix</h2>
<table id="matrix"></table>

<h2>Simulation</h2>
<div id="simmeta" class="meta"></div>
<table id="sim"></table>

<h2>Parameters</h2>
<form id="params">
  <label>down <input name="down" step="any" type="number" placeholder="-0.002"></label>
  <label>up <input name="up" step="any" type="number" placeholder="0.002"></label>
  <label>steps <input name="steps" type="number" min="1" placeholder="10"></label>
  <label>trials <input name="trials" type="number" min="1" placeholder="1000"></label>
  <label>seed <input name="seed" type="number" min="0"></label>
  <button type="submit">Recompute</button>
</form>

<script>
const STATES = ["down", "flat", "up"];

function pct(x) { return (x * 100).toFixed(2) + "%"; }

function stateCell(s) { return `<span class="state ${s}">${s}</span>`; }

function probTable(el, probs) {
  let head = "<tr>" + STATES.map(s => `<th>${stateCell(s)}</th>`).join("") + "</tr>";
  let row = "<tr>" + STATES.map(s => `<td>${pct(probs[s] ?? 0)}</td>`).join("") + "</tr>";
  el.innerHTML = head + row;
}

function render(f) {
  document.getElementById("error").textContent = "";
  document.getElementById("meta").textContent =
    `${f.first_date} to ${f.last_date} | ${f.clean_rows}/${f.raw_rows} clean rows | ` +
    `thresholds ${f.down_threshold} / ${f.up_threshold}`;

  document.getElementById("next").innerHTML =
    `current ${stateCell(f.current_state)} &rarr; predicted ${stateCell(f.predicted_state)}`;
  probTable(document.getElementById("probs"), f.next_day_probabilities);

  const m = document.getElementById("matrix");
  let html = "<tr><th></th>" + STATES.map(s => `<th>${stateCell(s)}</th>`).join("") + "</tr>";
  for (const from of STATES) {
    const row = f.transition_matrix[from];
    if (!row) continue;
    html += `<tr><th>${stateCell(from)}</th>` +
      STATES.map(s => `<td>${(row[s] ?? 0).toFixed(4)}</td>`).join("") + "</tr>";
  }
  m.innerHTML = html;

  document.getElementById("simmeta").textContent =
    `${f.simulation_steps} steps, ${f.simulation_trials} trials`;
  probTable(document.getElementById("sim"), f.simulation);
}

async function load(query) {
  try {
    const resp = await fetch("/api/v1/forecast" + (query ? "?" + query : ""));
    const body = await resp.json();
    if (!resp.ok) throw new Error(body.error || resp.statusText);
    render(body);
  } catch (err) {
    document.getElementById("error").textContent = "forecast unavailable: " + err.message;
  }
}

document.getElementById("params").addEventListener("submit", (ev) => {
  ev.preventDefault();
  const data = new FormData(ev.target);
  const params = new URLSearchParams();
  for (const [key, value] of data.entries()) {
    if (value !== "") params.set(key, value);
  }
  load(params.toString());
});

load("");
</script>
</body>
</html>
"#;
