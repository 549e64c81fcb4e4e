//! The render pipeline (§4.2): element tree → fiber tree, with one dedicated reactive computation
//! per function component so that a signal change re-renders exactly the subtree that read it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::rc::Rc;

use fabricate_reactive::{create_effect, on_cleanup};

use crate::element::{Element, ElementType};
use crate::error::{RenderError, StructuralPanic};
use crate::fiber::{FiberHandle, FiberNode};
use crate::instance::{AccessorBundle, InstanceRegistry};
use crate::path::kebab_case;
use crate::props::Props;

struct RenderFrame {
    registry: Rc<InstanceRegistry>,
    path: Vec<String>,
    direct_ids: RefCell<Vec<String>>,
    saw_placeholder: std::cell::Cell<bool>,
}

thread_local! {
    static RENDER_STACK: RefCell<Vec<Rc<RenderFrame>>> = const { RefCell::new(Vec::new()) };
}

/// Declares a resource instance from inside a component body (§4.3). Panics if called outside of
/// a render pass, matching the framework precondition that it only makes sense during one.
#[cfg_attr(debug_assertions, track_caller)]
pub fn use_instance(construct_type: &str, props: Props) -> AccessorBundle {
    RENDER_STACK.with(|stack| {
        let stack = stack.borrow();
        let frame = stack
            .last()
            .expect("use_instance called outside of a render pass");

        let base_id = {
            let mut p = frame.path.clone();
            p.push(kebab_case(construct_type));
            p.join(".")
        };
        let mut id = base_id.clone();
        let mut ordinal = 1u32;
        while frame.direct_ids.borrow().contains(&id) {
            ordinal += 1;
            id = format!("{base_id}-{ordinal}");
        }

        if frame.registry.contains_id(&id) {
            std::panic::panic_any(StructuralPanic(RenderError::DuplicateId(id)));
        }

        let bundle = frame
            .registry
            .use_instance(id.clone(), frame.path.clone(), construct_type.to_string(), props);
        if bundle.is_placeholder() {
            frame.saw_placeholder.set(true);
        } else {
            frame.direct_ids.borrow_mut().push(id);
        }
        bundle
    })
}

/// Builds the fiber tree for `root`, wiring each component fiber to its own reactive computation.
/// Structural errors raised anywhere in the tree (including inside a later, reactively-triggered
/// re-render) surface here as `Err` only for the initial pass; a structural error discovered on a
/// later pass propagates as an ordinary panic, consistent with §7 treating Structural errors as
/// fatal at the point they're discovered.
pub fn run(root: &Element, registry: &Rc<InstanceRegistry>) -> Result<FiberHandle, RenderError> {
    let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
        render_into(root, Vec::new(), root.key.clone(), registry)
    }));
    match result {
        Ok(fiber) => Ok(fiber),
        Err(payload) => match payload.downcast::<StructuralPanic>() {
            Ok(structural) => Err(structural.0),
            Err(other) => std::panic::resume_unwind(other),
        },
    }
}

fn render_into(
    element: &Element,
    path: Vec<String>,
    key: Option<String>,
    registry: &Rc<InstanceRegistry>,
) -> FiberHandle {
    match &element.element_type {
        ElementType::Tag(tag) => {
            let fiber = FiberNode::new_handle(tag.clone(), path.clone(), key);
            let children = render_children(&element.children, &path, registry);
            fiber.borrow_mut().children = children;
            fiber
        }
        ElementType::Fragment => {
            let fiber = FiberNode::new_handle("fragment".to_string(), path.clone(), key);
            let children = render_children(&element.children, &path, registry);
            fiber.borrow_mut().children = children;
            fiber
        }
        ElementType::Component(component) => {
            let fiber = FiberNode::new_handle(component.name.to_string(), path.clone(), key);

            let fiber_for_effect = Rc::clone(&fiber);
            let registry_for_effect = Rc::clone(registry);
            let component = component.clone();
            let props = element.props.clone();
            let path_for_effect = path.clone();

            create_effect(move || {
                let fiber_for_cleanup = Rc::clone(&fiber_for_effect);
                let registry_for_cleanup = Rc::clone(&registry_for_effect);
                on_cleanup(move || {
                    let ids = std::mem::take(&mut fiber_for_cleanup.borrow_mut().instance_ids);
                    for id in ids {
                        registry_for_cleanup.remove(&id);
                    }
                });

                let frame = Rc::new(RenderFrame {
                    registry: Rc::clone(&registry_for_effect),
                    path: path_for_effect.clone(),
                    direct_ids: RefCell::new(Vec::new()),
                    saw_placeholder: std::cell::Cell::new(false),
                });
                RENDER_STACK.with(|stack| stack.borrow_mut().push(Rc::clone(&frame)));
                let result_element = (component.render)(props.clone());
                RENDER_STACK.with(|stack| {
                    stack.borrow_mut().pop();
                });

                let child = render_into(
                    &result_element,
                    path_for_effect.clone(),
                    None,
                    &registry_for_effect,
                );

                let mut fb = fiber_for_effect.borrow_mut();
                fb.instance_ids = frame.direct_ids.borrow().clone();
                fb.placeholder = frame.saw_placeholder.get();
                fb.children = vec![child];
            });

            fiber
        }
    }
}

fn render_children(
    children: &[Element],
    parent_path: &[String],
    registry: &Rc<InstanceRegistry>,
) -> Vec<FiberHandle> {
    let mut label_counts: HashMap<String, u32> = HashMap::new();
    for child in children {
        *label_counts.entry(child.label()).or_insert(0) += 1;
    }

    children
        .iter()
        .map(|child| {
            let label = child.label();
            if label_counts[&label] > 1 && child.key.is_none() {
                std::panic::panic_any(StructuralPanic(RenderError::DuplicateSiblingConstruct {
                    parent_path: parent_path.join("."),
                    construct_type: label,
                }));
            }
            let mut path = parent_path.to_vec();
            path.push(match &child.key {
                Some(k) => format!("{label}-{k}"),
                None => label,
            });
            render_into(child, path, child.key.clone(), registry)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ComponentFn;
    use crate::fiber::flatten;
    use crate::props::PropValue;
    use fabricate_reactive::create_root;

    fn tag(name: &str, children: Vec<Element>) -> Element {
        Element {
            element_type: ElementType::Tag(name.to_string()),
            props: Props::new(),
            children,
            key: None,
        }
    }

    fn component(name: &'static str, f: impl Fn(Props) -> Element + 'static) -> Element {
        Element {
            element_type: ElementType::Component(ComponentFn::new(name, f)),
            props: Props::new(),
            children: Vec::new(),
            key: None,
        }
    }

    #[test]
    fn renders_a_leaf_instance() {
        let root = create_root(|| {
            let registry = Rc::new(InstanceRegistry::empty());
            let element = component("Database", |_props| {
                let mut props = Props::new();
                props.insert("name".to_string(), PropValue::string("db"));
                use_instance("Database", props);
                tag("noop", vec![])
            });
            let fiber = run(&element, &registry).expect("render should succeed");
            let nodes = flatten(&fiber, &registry);
            assert_eq!(nodes.len(), 1);
            assert_eq!(nodes[0].construct_type, "Database");
        });
        root.dispose();
    }

    #[test]
    fn duplicate_sibling_without_key_is_a_structural_error() {
        let root = create_root(|| {
            let registry = Rc::new(InstanceRegistry::empty());
            let make_server = |_props: Props| {
                let mut props = Props::new();
                props.insert("name".to_string(), PropValue::string("s"));
                use_instance("Server", props);
                tag("noop", vec![])
            };
            let element = tag(
                "root",
                vec![
                    component("Server", make_server),
                    component("Server", make_server),
                ],
            );
            let err = run(&element, &registry).unwrap_err();
            assert!(matches!(err, RenderError::DuplicateSiblingConstruct { .. }));
        });
        root.dispose();
    }

    #[test]
    fn keyed_siblings_of_the_same_type_are_fine() {
        let root = create_root(|| {
            let registry = Rc::new(InstanceRegistry::empty());
            let make_attachment = |_props: Props| {
                let mut props = Props::new();
                props.insert("name".to_string(), PropValue::string("a"));
                use_instance("PolicyAttachment", props);
                tag("noop", vec![])
            };
            let mut a = component("PolicyAttachment", make_attachment);
            a.key = Some("arn-1".to_string());
            let mut b = component("PolicyAttachment", make_attachment);
            b.key = Some("arn-2".to_string());
            let element = tag("root", vec![a, b]);
            let fiber = run(&element, &registry).expect("render should succeed");
            let nodes = flatten(&fiber, &registry);
            assert_eq!(nodes.len(), 2);
        });
        root.dispose();
    }

    #[test]
    fn undefined_prop_produces_no_node() {
        let root = create_root(|| {
            let registry = Rc::new(InstanceRegistry::empty());
            let element = component("Server", |_props| {
                let mut props = Props::new();
                props.insert("url".to_string(), PropValue::Undefined);
                use_instance("Server", props);
                tag("noop", vec![])
            });
            let fiber = run(&element, &registry).expect("render should succeed");
            let nodes = flatten(&fiber, &registry);
            assert!(nodes.is_empty());
            assert!(fiber.borrow().placeholder, "a fiber whose instance never materialized is a placeholder");
        });
        root.dispose();
    }

    #[test]
    fn fully_materialized_fiber_is_not_a_placeholder() {
        let root = create_root(|| {
            let registry = Rc::new(InstanceRegistry::empty());
            let element = component("Database", |_props| {
                let mut props = Props::new();
                props.insert("name".to_string(), PropValue::string("db"));
                use_instance("Database", props);
                tag("noop", vec![])
            });
            let fiber = run(&element, &registry).expect("render should succeed");
            assert!(!fiber.borrow().placeholder);
        });
        root.dispose();
    }
}
