use super::super::ClassifierPage;
use yew::prelude::*;

pub fn render_preview_area(model: &ClassifierPage) -> Html {
    let Some(file_data) = &model.file else {
        return html! {};
    };
    html! {
        <figure class="preview-area">
            <img
                src={file_data.preview_url.to_string()}
                alt={file_data.file.name()}
                class="preview-image"
            />
            <figcaption>{"Imagen cargada"}</figcaption>
        </figure>
    }
}
