//! [`Element`]: the record produced by JSX-like construction, consumed by the renderer.

use std::rc::Rc;

use crate::props::Props;

/// A function component: a render function plus the stable name used to derive path segments
/// (§4.2 "a stable slug derived from the component name").
#[derive(Clone)]
pub struct ComponentFn {
    pub name: &'static str,
    pub render: Rc<dyn Fn(Props) -> Element>,
}

impl ComponentFn {
    pub fn new(name: &'static str, render: impl Fn(Props) -> Element + 'static) -> Self {
        Self {
            name,
            render: Rc::new(render),
        }
    }
}

/// The three kinds of `type` a JSX-like element may carry (§4.2 "Inputs").
#[derive(Clone)]
pub enum ElementType {
    Component(ComponentFn),
    Fragment,
    Tag(String),
}

/// `{ type, props, key? }` plus its children, exactly the shape `createElement` produces.
#[derive(Clone)]
pub struct Element {
    pub element_type: ElementType,
    pub props: Props,
    pub children: Vec<Element>,
    pub key: Option<String>,
}

impl Element {
    pub fn label(&self) -> String {
        match &self.element_type {
            ElementType::Component(c) => c.name.to_string(),
            ElementType::Fragment => "fragment".to_string(),
            ElementType::Tag(tag) => tag.clone(),
        }
    }
}
