use crate::config::VerbatimConfig;
use crate::content::Content;
use crate::reconcile::Verbatim;
use dom_store::DomStore;
use serde_json::Value;
use std::rc::Rc;
use template::{Helper, HelperEnv, HelperError, HelperOptions};

static NO_CONTENT: Value = Value::Null;

impl Helper for Verbatim {
    fn call(&self, params: &[&Value], options: HelperOptions<'_>) -> Result<(), HelperError> {
        let value = params.first().copied().unwrap_or(&NO_CONTENT);
        let content = Content::from_value(value, self.config().non_string);
        self.reconcile(options.ctx, &content, &options.region)?;
        Ok(())
    }

    fn after_patch(&self, dom: &DomStore) {
        self.prune(dom);
    }
}

/// Register the reconciler under the default helper names.
pub fn register_verbatim_helper<E: HelperEnv + ?Sized>(env: &mut E) -> Rc<Verbatim> {
    register_verbatim_helper_with(env, VerbatimConfig::default())
}

/// Register one shared reconciler under every name in `config.helper_names`.
pub fn register_verbatim_helper_with<E: HelperEnv + ?Sized>(
    env: &mut E,
    config: VerbatimConfig,
) -> Rc<Verbatim> {
    let verbatim = Rc::new(Verbatim::new(config));
    for name in &verbatim.config().helper_names {
        env.register_helper(name, verbatim.clone());
    }
    verbatim
}
