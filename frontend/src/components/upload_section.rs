use super::super::{ClassifierPage, Msg};
use gloo_file::File as GlooFile;
use shared::{PageStatus, is_accepted_upload};
use web_sys::HtmlInputElement;
use yew::prelude::*;

pub fn render_upload_section(
    model: &ClassifierPage,
    ctx: &Context<ClassifierPage>,
    status: &PageStatus,
) -> Html {
    let handle_change = ctx.link().batch_callback(|e: Event| {
        let input: HtmlInputElement = e.target_unchecked_into();
        let file = input.files().and_then(|files| files.item(0));
        input.set_value("");

        // Cancelling the picker leaves the current result alone.
        let file = file?;
        if is_accepted_upload(&file.type_(), &file.name()) {
            Some(Msg::FileSelected(GlooFile::from(file)))
        } else {
            Some(Msg::FileRejected(
                "Formato no admitido: sube una imagen JPG o PNG.".into(),
            ))
        }
    });

    html! {
        <div class="upload-section">
            <label for="file-input" class="upload-label">{"Sube una imagen de la carretera"}</label>
            <input
                type="file"
                id="file-input"
                accept={format!("{},.jpg,.jpeg,.png", status.accepted_types.join(","))}
                disabled={model.loading}
                onchange={handle_change}
            />
            if model.loading {
                <p class="loading-message">{"Analizando..."}</p>
            }
        </div>
    }
}
