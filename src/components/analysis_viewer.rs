// src/components/analysis_viewer.rs
use crate::analysis_parser::parse_analysis_json;
use crate::components::region_legend::RegionLegend;
use crate::components::report_panel::ReportPanel;
use crate::linked_analysis::LinkedAnalysis;
use crate::overlay::{ImageSize, OverlayRect};
use crate::analysis_data::AnalysisResult;
use crate::utils::resource_url;
use crate::viewer_config::{CaseInfo, HighlightStyle};
use gloo_events::EventListener;
use gloo_net::http::Request;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Event, HtmlImageElement, KeyboardEvent, MouseEvent};
use yew::prelude::*;

const MIN_SCALE: f32 = 0.2;
const MAX_SCALE: f32 = 8.0;
const DEFAULT_PANEL_WIDTH: f64 = 50.0;
const MIN_PANEL_WIDTH: f64 = 20.0;
const MAX_PANEL_WIDTH: f64 = 80.0;
// used when the content container cannot be measured
const FALLBACK_CONTAINER_WIDTH: f64 = 1000.0;

#[derive(Properties, PartialEq)]
pub struct AnalysisViewerProps {
    pub case: CaseInfo,
    pub highlight: HighlightStyle,
}

pub enum AnalysisViewerMsg {
    Load(String),
    Loaded(u32, Result<AnalysisResult, String>),
    HoverRegions(Vec<u32>),
    ClearHover,
    PinRegions(Vec<u32>),
    Unpin,
    ImageLoadedWithDimensions(u32, u32),
    ImageFailed,
    UpdateImageScale(f32),
    ResetView,
    StartDrag(MouseEvent),
    DragImage(MouseEvent),
    EndDrag,
    ToggleMetadata,
    KeyPressed(String),
    StartSplitterDrag(MouseEvent),
    SplitterDrag(MouseEvent),
    EndSplitterDrag,
}

pub struct AnalysisViewer {
    analysis: Option<LinkedAnalysis>,
    loading: bool,
    error: Option<String>,
    // incremented per load; stale responses are dropped
    generation: u32,
    current_case: String,
    // natural image size, None until the <img> has loaded
    image_size: Option<ImageSize>,
    image_failed: bool,
    // zoom and pan
    image_scale: f32,
    image_offset_x: f32,
    image_offset_y: f32,
    dragging: bool,
    last_mouse_x: f32,
    last_mouse_y: f32,
    show_metadata_popup: bool,
    // image column width in percent of the content area
    image_panel_width: f64,
    splitter_start_x: f64,
    splitter_start_width: f64,
    // document-level move/up listeners, alive only while dragging
    splitter_listeners: Option<(EventListener, EventListener)>,
    _keyboard: EventListener,
}

impl Component for AnalysisViewer {
    type Message = AnalysisViewerMsg;
    type Properties = AnalysisViewerProps;

    fn create(ctx: &Context<Self>) -> Self {
        let case = ctx.props().case.clone();
        ctx.link()
            .send_message(AnalysisViewerMsg::Load(resource_url(&case.data_path)));

        let link = ctx.link().clone();
        let keyboard = EventListener::new(&gloo_utils::document(), "keydown", move |event| {
            if let Some(key_event) = event.dyn_ref::<KeyboardEvent>() {
                link.send_message(AnalysisViewerMsg::KeyPressed(key_event.key()));
            }
        });

        Self {
            analysis: None,
            loading: true,
            error: None,
            generation: 0,
            current_case: case.id,
            image_size: None,
            image_failed: false,
            image_scale: 1.0,
            image_offset_x: 0.0,
            image_offset_y: 0.0,
            dragging: false,
            last_mouse_x: 0.0,
            last_mouse_y: 0.0,
            show_metadata_popup: false,
            image_panel_width: DEFAULT_PANEL_WIDTH,
            splitter_start_x: 0.0,
            splitter_start_width: DEFAULT_PANEL_WIDTH,
            splitter_listeners: None,
            _keyboard: keyboard,
        }
    }

    fn changed(&mut self, ctx: &Context<Self>, _old: &Self::Properties) -> bool {
        let case = &ctx.props().case;
        if case.id == self.current_case {
            // highlight style may have changed
            return true;
        }

        self.current_case = case.id.clone();
        self.analysis = None;
        self.image_size = None;
        self.image_failed = false;
        self.loading = true;
        self.error = None;
        self.reset_view();
        let cache_bust = js_sys::Date::now() as u64;
        let path = format!("{}?v={}", resource_url(&case.data_path), cache_bust);
        ctx.link().send_message(AnalysisViewerMsg::Load(path));
        true
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            AnalysisViewerMsg::Load(path) => {
                self.generation = self.generation.wrapping_add(1);
                let generation = self.generation;
                let link = ctx.link().clone();
                spawn_local(async move {
                    let result = match Request::get(&path).send().await {
                        Ok(resp) if resp.ok() => match resp.text().await {
                            Ok(json) => parse_analysis_json(&json, &path),
                            Err(e) => Err(format!("Failed to read response text: {:?}", e)),
                        },
                        Ok(resp) => Err(format!(
                            "Analysis not available ({} {})",
                            resp.status(),
                            resp.status_text()
                        )),
                        Err(e) => Err(format!("Failed to load analysis: {:?}", e)),
                    };
                    link.send_message(AnalysisViewerMsg::Loaded(generation, result));
                });
                false
            }
            AnalysisViewerMsg::Loaded(generation, res) => {
                if generation != self.generation {
                    log::debug!("Dropping stale analysis response #{}", generation);
                    return false;
                }
                self.loading = false;
                match res {
                    Ok(result) => {
                        log::info!(
                            "Loaded analysis for case {} ({} regions)",
                            self.current_case,
                            result.regions.len()
                        );
                        // regions, index, sections and selection are replaced together
                        self.analysis = Some(LinkedAnalysis::new(result));
                        self.image_size = None;
                        self.image_failed = false;
                        self.error = None;
                    }
                    Err(e) => {
                        log::error!("{}", e);
                        self.analysis = None;
                        self.error = Some(e);
                    }
                }
                true
            }
            AnalysisViewerMsg::HoverRegions(numbers) => self
                .analysis
                .as_mut()
                .map(|a| a.hover_enter(numbers))
                .unwrap_or(false),
            AnalysisViewerMsg::ClearHover => self
                .analysis
                .as_mut()
                .map(|a| a.hover_leave())
                .unwrap_or(false),
            AnalysisViewerMsg::PinRegions(numbers) => self
                .analysis
                .as_mut()
                .map(|a| a.toggle_pin(numbers))
                .unwrap_or(false),
            AnalysisViewerMsg::Unpin => self
                .analysis
                .as_mut()
                .map(|a| a.clear_pin())
                .unwrap_or(false),
            AnalysisViewerMsg::ImageLoadedWithDimensions(width, height) => {
                self.image_size = ImageSize::loaded(width, height);
                self.image_failed = false;
                if self.image_size.is_none() {
                    log::warn!("Image reported no natural size; overlays disabled");
                }
                true
            }
            AnalysisViewerMsg::ImageFailed => {
                log::warn!("Image for case {} failed to load", self.current_case);
                self.image_size = None;
                self.image_failed = true;
                true
            }
            AnalysisViewerMsg::UpdateImageScale(factor) => {
                self.image_scale = (self.image_scale * factor).clamp(MIN_SCALE, MAX_SCALE);
                true
            }
            AnalysisViewerMsg::ResetView => {
                self.reset_view();
                true
            }
            AnalysisViewerMsg::StartDrag(event) => {
                self.dragging = true;
                self.last_mouse_x = event.client_x() as f32;
                self.last_mouse_y = event.client_y() as f32;
                false
            }
            AnalysisViewerMsg::DragImage(event) => {
                if !self.dragging {
                    return false;
                }
                let x = event.client_x() as f32;
                let y = event.client_y() as f32;
                self.image_offset_x += x - self.last_mouse_x;
                self.image_offset_y += y - self.last_mouse_y;
                self.last_mouse_x = x;
                self.last_mouse_y = y;
                true
            }
            AnalysisViewerMsg::EndDrag => {
                self.dragging = false;
                false
            }
            AnalysisViewerMsg::ToggleMetadata => {
                self.show_metadata_popup = !self.show_metadata_popup;
                true
            }
            AnalysisViewerMsg::KeyPressed(key) => match key.as_str() {
                "Escape" => {
                    if self.show_metadata_popup {
                        self.show_metadata_popup = false;
                        return true;
                    }
                    self.analysis
                        .as_mut()
                        .map(|a| a.clear_selection())
                        .unwrap_or(false)
                }
                "+" | "=" => {
                    ctx.link()
                        .send_message(AnalysisViewerMsg::UpdateImageScale(1.2));
                    false
                }
                "-" | "_" => {
                    ctx.link()
                        .send_message(AnalysisViewerMsg::UpdateImageScale(1.0 / 1.2));
                    false
                }
                "r" | "R" => {
                    self.reset_view();
                    true
                }
                _ => false,
            },
            AnalysisViewerMsg::StartSplitterDrag(event) => {
                event.prevent_default();
                self.splitter_start_x = event.client_x() as f64;
                self.splitter_start_width = self.image_panel_width;

                let document = gloo_utils::document();
                let move_link = ctx.link().clone();
                let on_move = EventListener::new(&document, "mousemove", move |e| {
                    if let Some(mouse) = e.dyn_ref::<MouseEvent>() {
                        move_link.send_message(AnalysisViewerMsg::SplitterDrag(mouse.clone()));
                    }
                });
                let up_link = ctx.link().clone();
                let on_up = EventListener::new(&document, "mouseup", move |_| {
                    up_link.send_message(AnalysisViewerMsg::EndSplitterDrag);
                });
                self.splitter_listeners = Some((on_move, on_up));

                if let Some(body) = document.body() {
                    let _ = body.set_attribute("data-splitter-active", "true");
                }
                true
            }
            AnalysisViewerMsg::SplitterDrag(event) => {
                if self.splitter_listeners.is_none() {
                    return false;
                }
                let dx = event.client_x() as f64 - self.splitter_start_x;
                self.image_panel_width =
                    panel_width_after_drag(self.splitter_start_width, dx, content_width());
                true
            }
            AnalysisViewerMsg::EndSplitterDrag => {
                // dropping the listeners detaches them
                self.splitter_listeners = None;
                if let Some(body) = gloo_utils::document().body() {
                    let _ = body.remove_attribute("data-splitter-active");
                }
                log::debug!("Image panel width set to {:.1}%", self.image_panel_width);
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        if self.loading {
            return html! {
                <div class="loading"><p>{"Loading analysis..."}</p></div>
            };
        }
        if let Some(err) = &self.error {
            return html! {
                <div class="error"><p>{format!("Error: {}", err)}</p></div>
            };
        }
        let Some(analysis) = &self.analysis else {
            return html! {
                <div class="empty"><p>{"No analysis loaded."}</p></div>
            };
        };

        let on_hover = ctx.link().callback(AnalysisViewerMsg::HoverRegions);
        let on_leave = ctx.link().callback(|_: ()| AnalysisViewerMsg::ClearHover);
        let on_pin = ctx.link().callback(AnalysisViewerMsg::PinRegions);

        html! {
            <div class="analysis-viewer-container">
                { self.render_controls(ctx, analysis) }
                <div class="viewer-content" style={self.grid_style()}>
                    <div class="image-column">
                        { self.render_image_panel(ctx, analysis) }
                        <RegionLegend
                            entries={analysis.legend()}
                            total_regions={analysis.result.regions.len()}
                            pinned={analysis.is_pinned()}
                            on_hover={on_hover.clone()}
                            on_leave={on_leave.clone()}
                            on_pin={on_pin.clone()}
                        />
                    </div>
                    { self.render_splitter(ctx) }
                    <ReportPanel
                        sections={analysis.sections.clone()}
                        active={analysis.active().clone()}
                        {on_hover}
                        {on_leave}
                        {on_pin}
                    />
                    { self.render_metadata_popup(ctx, analysis) }
                </div>
            </div>
        }
    }
}

impl AnalysisViewer {
    fn reset_view(&mut self) {
        self.image_scale = 1.0;
        self.image_offset_x = 0.0;
        self.image_offset_y = 0.0;
        self.dragging = false;
    }

    fn grid_style(&self) -> String {
        format!(
            "grid-template-columns: {:.2}% 8px minmax(0, 1fr);",
            self.image_panel_width
        )
    }

    fn render_splitter(&self, ctx: &Context<Self>) -> Html {
        let onmousedown = ctx.link().callback(AnalysisViewerMsg::StartSplitterDrag);

        html! {
            <div
                class={classes!("splitter", self.splitter_listeners.is_some().then_some("dragging"))}
                {onmousedown}
                title="Drag to resize panels"
            >
                <div class="splitter-handle"></div>
            </div>
        }
    }

    fn render_controls(&self, ctx: &Context<Self>, analysis: &LinkedAnalysis) -> Html {
        let zoom_in = ctx
            .link()
            .callback(|_| AnalysisViewerMsg::UpdateImageScale(1.2));
        let zoom_out = ctx
            .link()
            .callback(|_| AnalysisViewerMsg::UpdateImageScale(0.8));
        let reset = ctx.link().callback(|_| AnalysisViewerMsg::ResetView);
        let toggle_meta = ctx.link().callback(|_| AnalysisViewerMsg::ToggleMetadata);
        let unpin = ctx.link().callback(|_| AnalysisViewerMsg::Unpin);

        html! {
            <div class="controls-panel">
                <div class="image-controls">
                    <button onclick={zoom_in} title="Zoom In (+)">{"🔍 +"}</button>
                    <button onclick={zoom_out} title="Zoom Out (-)">{"🔍 -"}</button>
                    <button onclick={reset} title="Reset View (R)">{"⟲ Reset"}</button>
                    <span class="zoom-level">{format!("{}%", (self.image_scale * 100.0) as i32)}</span>
                </div>
                <div class="selection-controls">
                    if analysis.is_pinned() {
                        <button onclick={unpin} title="Release pinned selection (Esc)">{"Unpin"}</button>
                    }
                    <button onclick={toggle_meta}>
                        { if self.show_metadata_popup { "Hide details" } else { "Show details" } }
                    </button>
                </div>
            </div>
        }
    }

    fn render_image_panel(&self, ctx: &Context<Self>, analysis: &LinkedAnalysis) -> Html {
        let image_url = analysis.result.image_reference.clone();
        if image_url.is_empty() {
            return html! {
                <div class="image-panel"><p>{"No image available"}</p></div>
            };
        }

        let onwheel = ctx.link().callback(|e: WheelEvent| {
            e.prevent_default();
            let factor = if e.delta_y() < 0.0 { 1.1 } else { 0.9 };
            AnalysisViewerMsg::UpdateImageScale(factor)
        });
        let onmousedown = ctx.link().callback(|e: MouseEvent| {
            e.prevent_default();
            AnalysisViewerMsg::StartDrag(e)
        });
        let onmousemove = ctx.link().callback(AnalysisViewerMsg::DragImage);
        let onmouseup = ctx.link().callback(|_| AnalysisViewerMsg::EndDrag);
        let onmouseleave = ctx.link().callback(|_| AnalysisViewerMsg::EndDrag);

        // onload captures intrinsic natural size
        let onload = {
            let link = ctx.link().clone();
            Callback::from(move |e: Event| {
                if let Some(img) = e.target().and_then(|t| t.dyn_into::<HtmlImageElement>().ok()) {
                    link.send_message(AnalysisViewerMsg::ImageLoadedWithDimensions(
                        img.natural_width(),
                        img.natural_height(),
                    ));
                }
            })
        };

        // Image and overlays share one transformed container, so percentages
        // of the container are percentages of the natural image.
        let transform_style = format!(
            "transform-origin: 0 0; transform: translate({}px, {}px) scale({}); position: relative; display: inline-block;",
            self.image_offset_x, self.image_offset_y, self.image_scale
        );

        let onerror = ctx.link().callback(|_: Event| AnalysisViewerMsg::ImageFailed);

        let overlays = analysis.overlays(self.image_size);

        html! {
            <div class="image-panel">
                <div
                    class="image-container"
                    {onwheel}
                    {onmousedown}
                    {onmousemove}
                    {onmouseup}
                    {onmouseleave}
                >
                    <div class="image-and-overlay" style={transform_style}>
                        <img
                            key={self.generation.to_string()}
                            src={image_url}
                            alt={analysis.result.metadata.filename.clone()}
                            {onload}
                            {onerror}
                            style="display:block; max-width: none; max-height: none;"
                        />
                        { for overlays.iter().map(|rect| self.render_overlay(ctx, rect)) }
                    </div>
                </div>
                if self.image_failed {
                    <p class="image-notice">
                        { format!("Image not available ({}). Regions can be explored from the report and legend.", analysis.result.image_reference) }
                    </p>
                }
            </div>
        }
    }

    fn render_overlay(&self, ctx: &Context<Self>, rect: &OverlayRect) -> Html {
        let style = format!(
            "position: absolute; box-sizing: border-box; pointer-events: none; {} {}",
            rect.css_position(),
            ctx.props().highlight.css()
        );
        html! {
            <div class="region-overlay" {style} title={rect.label.clone()}>
                <span class="overlay-label">{ rect.number }</span>
            </div>
        }
    }

    fn render_metadata_popup(&self, ctx: &Context<Self>, analysis: &LinkedAnalysis) -> Html {
        if !self.show_metadata_popup {
            return html! {};
        }
        let on_close = ctx.link().callback(|_| AnalysisViewerMsg::ToggleMetadata);
        let result = &analysis.result;
        let meta = &result.metadata;

        let declared = |value: Option<usize>| {
            value
                .map(|v| v.to_string())
                .unwrap_or_else(|| "not declared".to_string())
        };
        let declared_size = match (meta.width, meta.height) {
            (Some(w), Some(h)) => format!("{} × {} px", w, h),
            _ => "not declared".to_string(),
        };
        let natural_size = match self.image_size {
            Some(size) => format!("{} × {} px", size.width, size.height),
            None => "not loaded".to_string(),
        };

        html! {
            <div class="metadata-popup-overlay">
                <div class="metadata-popup">
                    <div class="metadata-popup-header">
                        <h2>{"Analysis details"}</h2>
                        <button class="close-btn" onclick={on_close}>{"×"}</button>
                    </div>
                    <div class="metadata-popup-content">
                        <dl>
                            <dt>{"File:"}</dt><dd>{ &meta.filename }</dd>
                            <dt>{"Regions (declared):"}</dt><dd>{ declared(meta.num_regions) }</dd>
                            <dt>{"Regions (loaded):"}</dt><dd>{ result.regions.len() }</dd>
                            <dt>{"Mentioned (declared):"}</dt><dd>{ declared(meta.mentioned_regions) }</dd>
                            <dt>{"Mentioned (flagged):"}</dt><dd>{ result.mentioned_count() }</dd>
                            <dt>{"Linked terms:"}</dt><dd>{ analysis.index.len() }</dd>
                            <dt>{"Declared size:"}</dt><dd>{ declared_size }</dd>
                            <dt>{"Natural size:"}</dt><dd>{ natural_size }</dd>
                        </dl>
                        if !result.metadata_consistent() {
                            <p class="warning">{"Declared mentioned count does not match the region flags."}</p>
                        }
                    </div>
                </div>
            </div>
        }
    }
}

/// Width of the `.viewer-content` grid in pixels.
fn content_width() -> f64 {
    gloo_utils::document()
        .query_selector(".viewer-content")
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok())
        .map(|el| el.client_width() as f64)
        .filter(|w| *w > 0.0)
        .unwrap_or(FALLBACK_CONTAINER_WIDTH)
}

/// New image column width after dragging the splitter `dx` pixels.
fn panel_width_after_drag(start_width: f64, dx: f64, container_width: f64) -> f64 {
    if container_width <= 0.0 || !dx.is_finite() {
        return start_width.clamp(MIN_PANEL_WIDTH, MAX_PANEL_WIDTH);
    }
    let dx_percent = dx / container_width * 100.0;
    (start_width + dx_percent).clamp(MIN_PANEL_WIDTH, MAX_PANEL_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splitter_drag_in_percent() {
        assert_eq!(panel_width_after_drag(50.0, 100.0, 1000.0), 60.0);
        assert_eq!(panel_width_after_drag(50.0, -250.0, 1000.0), 25.0);
    }

    #[test]
    fn test_splitter_width_is_clamped() {
        assert_eq!(panel_width_after_drag(50.0, 900.0, 1000.0), MAX_PANEL_WIDTH);
        assert_eq!(panel_width_after_drag(50.0, -900.0, 1000.0), MIN_PANEL_WIDTH);
        assert_eq!(panel_width_after_drag(50.0, 10.0, 0.0), 50.0);
        assert_eq!(panel_width_after_drag(95.0, f64::NAN, 1000.0), MAX_PANEL_WIDTH);
    }
}
