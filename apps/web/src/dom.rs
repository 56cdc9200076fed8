//! `EventView` over the page's DOM.

use client_core::{EventView, FormKind};
use shared::domain::FormPayload;
use tracing::warn;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, FormData, HtmlFormElement, Window};

pub struct DomView {
    window: Window,
    document: Document,
    list: Element,
}

impl DomView {
    pub fn new(window: Window, document: Document, list: Element) -> Self {
        Self {
            window,
            document,
            list,
        }
    }
}

impl EventView for DomView {
    fn render_events(&self, lines: &[String]) {
        self.list.set_inner_html("");
        for line in lines {
            let item = match self.document.create_element("li") {
                Ok(item) => item,
                Err(err) => {
                    warn!(?err, "failed to create list item");
                    continue;
                }
            };
            item.set_text_content(Some(line));
            if let Err(err) = self.list.append_child(&item) {
                warn!(?err, "failed to append list item");
            }
        }
    }

    fn alert(&self, message: &str) {
        if let Err(err) = self.window.alert_with_message(message) {
            warn!(?err, "alert failed");
        }
    }

    fn reset_form(&self, form: FormKind) {
        match form_by_id(&self.document, form.element_id()) {
            Ok(element) => element.reset(),
            Err(err) => warn!(?err, form = form.element_id(), "form not found for reset"),
        }
    }
}

pub fn element_by_id(document: &Document, id: &str) -> Result<Element, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing element #{id}")))
}

pub fn form_by_id(document: &Document, id: &str) -> Result<HtmlFormElement, JsValue> {
    element_by_id(document, id)?
        .dyn_into::<HtmlFormElement>()
        .map_err(|_| JsValue::from_str(&format!("#{id} is not a form")))
}

/// Reads the form's current entries. File inputs carry no string value and
/// are left out.
pub fn form_payload(form: &HtmlFormElement) -> Result<FormPayload, JsValue> {
    let data = FormData::new_with_form(form)?;
    let entries = js_sys::try_iter(&data)?
        .ok_or_else(|| JsValue::from_str("form data is not iterable"))?;

    let mut payload = FormPayload::new();
    for entry in entries {
        let entry: js_sys::Array = entry?.dyn_into()?;
        let (Some(name), Some(value)) = (entry.get(0).as_string(), entry.get(1).as_string()) else {
            continue;
        };
        payload.insert(name, value);
    }
    Ok(payload)
}
