mod api;
mod components;

use components::header::render_header;
use components::preview_area::render_preview_area;
use components::results::render_results;
use components::upload_section::render_upload_section;
use components::utils::{render_error_message, render_fatal_error};
use gloo_file::{File as GlooFile, ObjectUrl};
use shared::{InferenceResponse, PageStatus};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

pub struct FileData {
    pub file: GlooFile,
    pub preview_url: ObjectUrl,
}

pub enum Msg {
    StatusLoaded(PageStatus),
    StatusFailed(String),
    FileSelected(GlooFile),
    FileRejected(String),
    InferenceResult(InferenceResponse),
    SetError(Option<String>),
}

/// One image at a time: pick, preview, classify.
pub struct ClassifierPage {
    pub status: Option<PageStatus>,
    pub status_error: Option<String>,
    pub file: Option<FileData>,
    pub result: Option<InferenceResponse>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Component for ClassifierPage {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        ctx.link().send_future(async {
            match api::fetch_status().await {
                Ok(status) => Msg::StatusLoaded(status),
                Err(e) => Msg::StatusFailed(e),
            }
        });

        Self {
            status: None,
            status_error: None,
            file: None,
            result: None,
            loading: false,
            error: None,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::StatusLoaded(status) => {
                if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                    document.set_title(&status.title);
                }
                self.status = Some(status);
                true
            }
            Msg::StatusFailed(error) => {
                log::error!("Status request failed: {}", error);
                self.status_error = Some(error);
                true
            }
            Msg::FileSelected(file) => self.handle_file_selected(ctx, file),
            Msg::FileRejected(reason) => {
                self.file = None;
                self.result = None;
                self.error = Some(reason);
                true
            }
            Msg::InferenceResult(response) => {
                log::info!(
                    "Prediction {}: {} ({})",
                    response.request_id,
                    response.label,
                    response.confidence_display
                );
                self.result = Some(response);
                self.loading = false;
                true
            }
            Msg::SetError(error) => {
                self.error = error;
                self.loading = false;
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="container">
                { render_header(self) }
                <main class="main-content">
                    { self.render_body(ctx) }
                </main>
            </div>
        }
    }
}

impl ClassifierPage {
    fn handle_file_selected(&mut self, ctx: &Context<Self>, file: GlooFile) -> bool {
        self.error = None;
        self.result = None;
        self.loading = true;
        self.file = Some(FileData {
            preview_url: ObjectUrl::from(file.clone()),
            file: file.clone(),
        });

        let link = ctx.link().clone();
        spawn_local(async move {
            match api::classify(file).await {
                Ok(response) => link.send_message(Msg::InferenceResult(response)),
                Err(e) => link.send_message(Msg::SetError(Some(e))),
            }
        });
        true
    }

    fn render_body(&self, ctx: &Context<Self>) -> Html {
        if let Some(error) = &self.status_error {
            return render_fatal_error(error);
        }
        let Some(status) = &self.status else {
            return html! { <p class="loading-message">{"Cargando el modelo..."}</p> };
        };
        if let Some(error) = &status.error {
            return render_fatal_error(&error.message);
        }

        html! {
            <>
                { render_upload_section(self, ctx, status) }
                { render_error_message(self) }
                { render_preview_area(self) }
                { render_results(self) }
            </>
        }
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("App starting...");
    yew::Renderer::<ClassifierPage>::new().render();
}
