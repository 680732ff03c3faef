use crate::{InstanceCounter, LiveTree, RenderContext, RenderError};
use html::entities::escape_text;
use html::serialize::{write_end_tag, write_start_tag};
use html::is_void_element;

/// Text-only backend: serializes the pass to markup. Has no live tree.
#[derive(Debug, Default)]
pub struct StringRenderer {
    out: String,
    open: Vec<String>,
    instances: InstanceCounter,
}

impl StringRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn finish(self) -> Result<String, RenderError> {
        if !self.open.is_empty() {
            return Err(RenderError::UnclosedElements(self.open.len()));
        }
        Ok(self.out)
    }
}

impl RenderContext for StringRenderer {
    fn live_tree(&mut self) -> Option<&mut dyn LiveTree> {
        None
    }

    fn open_element(
        &mut self,
        name: &str,
        _key: Option<&str>,
        attributes: &[(String, Option<String>)],
    ) -> Result<(), RenderError> {
        let name = name.to_ascii_lowercase();
        write_start_tag(&name, attributes, &mut self.out);
        self.open.push(name);
        Ok(())
    }

    fn close_element(&mut self, name: &str) -> Result<(), RenderError> {
        match self.open.last() {
            Some(open) if open.eq_ignore_ascii_case(name) => {}
            other => {
                return Err(RenderError::UnbalancedClose {
                    expected: other.cloned(),
                    found: name.to_string(),
                });
            }
        }
        if let Some(name) = self.open.pop() {
            if !is_void_element(&name) {
                write_end_tag(&name, &mut self.out);
            }
        }
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), RenderError> {
        escape_text(text, &mut self.out);
        Ok(())
    }

    fn emit_verbatim(&mut self, text: &str) -> Result<(), RenderError> {
        self.out.push_str(text);
        Ok(())
    }

    fn next_instance(&mut self, scope: u64) -> usize {
        self.instances.next(scope)
    }
}

/// Run one pass against a fresh [`StringRenderer`] and return the markup.
pub fn render_to_string<F, E>(render: F) -> Result<String, E>
where
    F: FnOnce(&mut StringRenderer) -> Result<(), E>,
    E: From<RenderError>,
{
    let mut renderer = StringRenderer::new();
    render(&mut renderer)?;
    Ok(renderer.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_elements_and_escapes_text() {
        let out = render_to_string(|r: &mut StringRenderer| {
            r.open_element("P", None, &[("class".into(), Some("a\"b".into()))])?;
            r.text("1 < 2 & 3")?;
            r.open_element("br", None, &[])?;
            r.close_element("br")?;
            r.close_element("p")
        })
        .expect("render");
        assert_eq!(out, r#"<p class="a&quot;b">1 &lt; 2 &amp; 3<br></p>"#);
    }

    #[test]
    fn verbatim_text_is_written_raw() {
        let mut r = StringRenderer::new();
        r.emit_verbatim("<h1>raw</h1>").expect("emit");
        assert!(r.live_tree().is_none());
        assert_eq!(r.finish().expect("finish"), "<h1>raw</h1>");
    }

    #[test]
    fn instances_are_counted_per_scope() {
        let mut r = StringRenderer::new();
        assert_eq!(r.next_instance(7), 0);
        assert_eq!(r.next_instance(7), 1);
        assert_eq!(r.next_instance(8), 0);
        assert_eq!(StringRenderer::new().next_instance(7), 0);
    }

    #[test]
    fn rejects_unbalanced_and_unclosed() {
        let mut r = StringRenderer::new();
        r.open_element("div", None, &[]).expect("open");
        assert_eq!(
            r.close_element("span"),
            Err(RenderError::UnbalancedClose {
                expected: Some("div".into()),
                found: "span".into()
            })
        );
        assert_eq!(r.finish(), Err(RenderError::UnclosedElements(1)));
    }
}
