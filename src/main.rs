// src/main.rs
mod analysis_data;
mod analysis_parser;
mod components;
mod linked_analysis;
mod overlay;
mod region_index;
mod report_parser;
mod selection;
mod term_highlighter;
mod utils;
mod viewer_config;

use components::analysis_viewer::AnalysisViewer;
use gloo_net::http::Request;
use utils::resource_url;
use viewer_config::{ConfigRegistry, ViewerConfig, CONFIG_PATH};
use yew::prelude::*;

pub enum AppMsg {
    ChangeCase(String),
    ConfigLoaded(ViewerConfig),
}

pub struct App {
    config: Option<ViewerConfig>,
    current_case: String,
}

impl Component for App {
    type Message = AppMsg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        ctx.link().send_future(async {
            match load_config().await {
                Ok(config) => AppMsg::ConfigLoaded(config),
                Err(e) => {
                    log::warn!("{}; using built-in configuration", e);
                    AppMsg::ConfigLoaded(ConfigRegistry::builtin())
                }
            }
        });

        Self {
            config: None,
            current_case: String::new(),
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            AppMsg::ChangeCase(case) => {
                if case == self.current_case {
                    return false;
                }
                self.current_case = case;
                true
            }
            AppMsg::ConfigLoaded(config) => {
                if let Some(first) = config.initial_case() {
                    self.current_case = first.id.clone();
                }
                log::info!("Viewer configured with {} case(s)", config.cases.len());
                self.config = Some(config);
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let Some(config) = &self.config else {
            return html! {
                <div class="app-container">
                    <main class="app-main">
                        <div class="loading">{"Loading configuration..."}</div>
                    </main>
                </div>
            };
        };

        let on_case_change = ctx.link().callback(AppMsg::ChangeCase);
        let current = config.get_case(&self.current_case).cloned();

        html! {
            <div class="app-container">
                <header class="app-header">
                    <h1>{ &config.title }</h1>
                    <p class="subtitle">{"Hover a highlighted term to locate it on the image, or a region to find it in the report."}</p>
                </header>

                <main class="app-main">
                    if config.cases.len() > 1 {
                        <div class="selectors-container">
                            <label for="case-select">{"Case: "}</label>
                            <select
                                id="case-select"
                                onchange={Callback::from(move |e: Event| {
                                    if let Some(select) = e.target_dyn_into::<web_sys::HtmlSelectElement>() {
                                        on_case_change.emit(select.value());
                                    }
                                })}
                            >
                                { for config.cases.iter().map(|case| html! {
                                    <option value={case.id.clone()} selected={self.current_case == case.id}>
                                        { case.label.clone() }
                                    </option>
                                }) }
                            </select>
                        </div>
                    }

                    { match current {
                        Some(case) => html! {
                            <AnalysisViewer {case} highlight={config.highlight.clone()} />
                        },
                        None => html! {
                            <div class="error">{"No analysis case is configured."}</div>
                        },
                    } }
                </main>

                <footer class="app-footer">
                    <p>{"Research prototype. Not for diagnostic use."}</p>
                </footer>
            </div>
        }
    }
}

async fn load_config() -> Result<ViewerConfig, String> {
    let url = resource_url(CONFIG_PATH);
    let resp = Request::get(&url)
        .send()
        .await
        .map_err(|e| format!("Failed to fetch {}: {:?}", url, e))?;
    if !resp.ok() {
        return Err(format!("Viewer config not found at {}", url));
    }
    let text = resp
        .text()
        .await
        .map_err(|e| format!("Failed to read {}: {:?}", url, e))?;
    ViewerConfig::parse(&text)
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<App>::new().render();
}
