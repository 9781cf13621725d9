//! Built-in node type definitions.

use n8n_workflow::{
    InputCount, NodeConnectionConfig, NodeCredentialDescription, NodeProperty, NodePropertyType,
    NodeTypeDescription, NodeVersion,
};

/// Names of every built-in node type, in registration order.
pub const ALL_NODE_TYPES: &[&str] = &[
    "n8n-nodes-base.manualTrigger",
    "n8n-nodes-base.scheduleTrigger",
    "n8n-nodes-base.webhook",
    "n8n-nodes-base.errorTrigger",
    "n8n-nodes-base.set",
    "n8n-nodes-base.if",
    "n8n-nodes-base.switch",
    "n8n-nodes-base.merge",
    "n8n-nodes-base.code",
    "n8n-nodes-base.httpRequest",
    "n8n-nodes-base.noOp",
    "n8n-nodes-base.filter",
    "n8n-nodes-base.sort",
    "n8n-nodes-base.limit",
    "n8n-nodes-base.removeDuplicates",
    "n8n-nodes-base.aggregate",
    "n8n-nodes-base.splitInBatches",
    "n8n-nodes-base.wait",
    "n8n-nodes-base.stopAndError",
    "n8n-nodes-base.executeWorkflow",
    "n8n-nodes-base.llmChat",
    "n8n-nodes-base.aiAgent",
];

/// Descriptions for every built-in node type, for listing over the API.
pub fn list_node_type_descriptions() -> Vec<NodeTypeDescription> {
    ALL_NODE_TYPES
        .iter()
        .filter_map(|name| get_node_type_description(name))
        .collect()
}

/// Get the description for a built-in node type.
pub fn get_node_type_description(node_type: &str) -> Option<NodeTypeDescription> {
    match node_type {
        "n8n-nodes-base.manualTrigger" => Some(manual_trigger_description()),
        "n8n-nodes-base.scheduleTrigger" => Some(schedule_trigger_description()),
        "n8n-nodes-base.webhook" => Some(webhook_trigger_description()),
        "n8n-nodes-base.errorTrigger" => Some(error_trigger_description()),
        "n8n-nodes-base.set" => Some(set_description()),
        "n8n-nodes-base.if" => Some(if_description()),
        "n8n-nodes-base.switch" => Some(switch_description()),
        "n8n-nodes-base.merge" => Some(merge_description()),
        "n8n-nodes-base.code" => Some(code_description()),
        "n8n-nodes-base.httpRequest" => Some(http_request_description()),
        "n8n-nodes-base.noOp" => Some(no_op_description()),
        "n8n-nodes-base.filter" => Some(filter_description()),
        "n8n-nodes-base.sort" => Some(sort_description()),
        "n8n-nodes-base.limit" => Some(limit_description()),
        "n8n-nodes-base.removeDuplicates" => Some(remove_duplicates_description()),
        "n8n-nodes-base.aggregate" => Some(aggregate_description()),
        "n8n-nodes-base.splitInBatches" => Some(split_in_batches_description()),
        "n8n-nodes-base.wait" => Some(wait_description()),
        "n8n-nodes-base.stopAndError" => Some(stop_and_error_description()),
        "n8n-nodes-base.executeWorkflow" => Some(execute_workflow_description()),
        "n8n-nodes-base.llmChat" => Some(llm_chat_description()),
        "n8n-nodes-base.aiAgent" => Some(ai_agent_description()),
        _ => None,
    }
}

fn main_input() -> NodeConnectionConfig {
    NodeConnectionConfig {
        connection_type: "main".to_string(),
        display_name: None,
        required: true,
        max_connections: None,
    }
}

fn main_output() -> NodeConnectionConfig {
    NodeConnectionConfig {
        connection_type: "main".to_string(),
        display_name: None,
        required: false,
        max_connections: None,
    }
}

fn manual_trigger_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.manualTrigger".to_string(),
        display_name: "Manual Trigger".to_string(),
        group: vec!["trigger".to_string()],
        description: "Triggers the workflow manually".to_string(),
        version: NodeVersion::Single(1),
        icon: Some("fa:play".to_string()),
        input_count: InputCount::Fixed(0),
        inputs: vec![],
        outputs: vec![main_output()],
        default_input_name: None,
        default_output_name: None,
        properties: vec![],
        credentials: None,
        trigger: true,
        polling: false,
    }
}

fn schedule_trigger_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.scheduleTrigger".to_string(),
        display_name: "Schedule Trigger".to_string(),
        group: vec!["trigger".to_string(), "schedule".to_string()],
        description: "Triggers the workflow on a time schedule".to_string(),
        version: NodeVersion::Single(1),
        icon: Some("fa:clock".to_string()),
        input_count: InputCount::Fixed(0),
        inputs: vec![],
        outputs: vec![main_output()],
        default_input_name: None,
        default_output_name: None,
        properties: vec![
            NodeProperty {
                name: "rule".to_string(),
                display_name: "Trigger Rule".to_string(),
                property_type: NodePropertyType::FixedCollection,
                default: None,
                description: Some("When the workflow should be triggered".to_string()),
                required: true,
                options: None,
                placeholder: None,
            },
            NodeProperty {
                name: "cronExpression".to_string(),
                display_name: "Cron Expression".to_string(),
                property_type: NodePropertyType::String,
                default: None,
                description: Some("Custom cron expression".to_string()),
                required: false,
                options: None,
                placeholder: Some("0 0 * * *".to_string()),
            },
        ],
        credentials: None,
        trigger: true,
        polling: true,
    }
}

fn webhook_trigger_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.webhook".to_string(),
        display_name: "Webhook".to_string(),
        group: vec!["trigger".to_string()],
        description: "Starts the workflow when a webhook is called".to_string(),
        version: NodeVersion::Multiple(vec![1, 2]),
        icon: Some("fa:bolt".to_string()),
        input_count: InputCount::Fixed(0),
        inputs: vec![],
        outputs: vec![main_output()],
        default_input_name: None,
        default_output_name: None,
        properties: vec![
            NodeProperty {
                name: "httpMethod".to_string(),
                display_name: "HTTP Method".to_string(),
                property_type: NodePropertyType::Options,
                default: None,
                description: Some("HTTP method to listen for".to_string()),
                required: false,
                options: None,
                placeholder: None,
            },
            NodeProperty {
                name: "path".to_string(),
                display_name: "Path".to_string(),
                property_type: NodePropertyType::String,
                default: None,
                description: Some("Webhook path".to_string()),
                required: true,
                options: None,
                placeholder: Some("/webhook-path".to_string()),
            },
            NodeProperty {
                name: "responseMode".to_string(),
                display_name: "Response Mode".to_string(),
                property_type: NodePropertyType::Options,
                default: None,
                description: Some("When to respond to the webhook".to_string()),
                required: false,
                options: None,
                placeholder: None,
            },
            NodeProperty {
                name: "responseData".to_string(),
                display_name: "Response Data".to_string(),
                property_type: NodePropertyType::Options,
                default: None,
                description: Some("What data to respond with".to_string()),
                required: false,
                options: None,
                placeholder: None,
            },
        ],
        credentials: None,
        trigger: true,
        polling: false,
    }
}

fn error_trigger_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.errorTrigger".to_string(),
        display_name: "Error Trigger".to_string(),
        group: vec!["trigger".to_string()],
        description: "Triggers when another workflow's execution fails".to_string(),
        version: NodeVersion::Single(1),
        icon: Some("fa:exclamation-triangle".to_string()),
        input_count: InputCount::Fixed(0),
        inputs: vec![],
        outputs: vec![main_output()],
        default_input_name: None,
        default_output_name: None,
        properties: vec![],
        credentials: None,
        trigger: true,
        polling: false,
    }
}

fn set_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.set".to_string(),
        display_name: "Set".to_string(),
        group: vec!["transform".to_string()],
        description: "Set values on items".to_string(),
        version: NodeVersion::Single(1),
        icon: Some("fa:pen".to_string()),
        input_count: InputCount::Fixed(1),
        inputs: vec![main_input()],
        outputs: vec![main_output()],
        default_input_name: None,
        default_output_name: None,
        properties: vec![
            NodeProperty {
                name: "mode".to_string(),
                display_name: "Mode".to_string(),
                property_type: NodePropertyType::Options,
                default: Some(n8n_workflow::NodeParameterValue::String("manual".to_string())),
                description: Some("Manual assignments or a JSON object to merge".to_string()),
                required: false,
                options: None,
                placeholder: None,
            },
            NodeProperty {
                name: "values".to_string(),
                display_name: "Values".to_string(),
                property_type: NodePropertyType::FixedCollection,
                default: None,
                description: Some("Values to set (manual mode)".to_string()),
                required: false,
                options: None,
                placeholder: None,
            },
            NodeProperty {
                name: "jsonOutput".to_string(),
                display_name: "JSON Output".to_string(),
                property_type: NodePropertyType::Json,
                default: None,
                description: Some("Object to shallow-merge onto the item (JSON mode)".to_string()),
                required: false,
                options: None,
                placeholder: None,
            },
            NodeProperty {
                name: "keepOnlySet".to_string(),
                display_name: "Keep Only Set".to_string(),
                property_type: NodePropertyType::Boolean,
                default: Some(n8n_workflow::NodeParameterValue::Boolean(false)),
                description: Some("Drop all other fields on the item".to_string()),
                required: false,
                options: None,
                placeholder: None,
            },
            NodeProperty {
                name: "delete".to_string(),
                display_name: "Delete".to_string(),
                property_type: NodePropertyType::Collection,
                default: None,
                description: Some("Dot-notation paths to remove".to_string()),
                required: false,
                options: None,
                placeholder: None,
            },
            NodeProperty {
                name: "rename".to_string(),
                display_name: "Rename".to_string(),
                property_type: NodePropertyType::FixedCollection,
                default: None,
                description: Some(
                    "List of {currentKey, newKey} dot-notation moves; no-op if currentKey is absent"
                        .to_string(),
                ),
                required: false,
                options: None,
                placeholder: None,
            },
        ],
        credentials: None,
        trigger: false,
        polling: false,
    }
}

fn if_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.if".to_string(),
        display_name: "If".to_string(),
        group: vec!["flow".to_string()],
        description: "Route items based on conditions".to_string(),
        version: NodeVersion::Single(1),
        icon: Some("fa:code-branch".to_string()),
        input_count: InputCount::Fixed(1),
        inputs: vec![main_input()],
        outputs: vec![
            NodeConnectionConfig {
                connection_type: "main".to_string(),
                display_name: Some("True".to_string()),
                required: false,
                max_connections: None,
            },
            NodeConnectionConfig {
                connection_type: "main".to_string(),
                display_name: Some("False".to_string()),
                required: false,
                max_connections: None,
            },
        ],
        default_input_name: None,
        default_output_name: None,
        properties: vec![NodeProperty {
            name: "conditions".to_string(),
            display_name: "Conditions".to_string(),
            property_type: NodePropertyType::Filter,
            default: None,
            description: Some("Conditions to check".to_string()),
            required: true,
            options: None,
            placeholder: None,
        }],
        credentials: None,
        trigger: false,
        polling: false,
    }
}

fn switch_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.switch".to_string(),
        display_name: "Switch".to_string(),
        group: vec!["flow".to_string()],
        description: "Route items to one of several outputs".to_string(),
        version: NodeVersion::Single(1),
        icon: Some("fa:map-signs".to_string()),
        input_count: InputCount::Fixed(1),
        inputs: vec![main_input()],
        outputs: vec![main_output(); 4],
        default_input_name: None,
        default_output_name: None,
        properties: vec![
            NodeProperty {
                name: "mode".to_string(),
                display_name: "Mode".to_string(),
                property_type: NodePropertyType::Options,
                default: None,
                description: Some("rules or expression".to_string()),
                required: false,
                options: None,
                placeholder: None,
            },
            NodeProperty {
                name: "rules".to_string(),
                display_name: "Rules".to_string(),
                property_type: NodePropertyType::FixedCollection,
                default: None,
                description: Some("Ordered list of routing rules, first match wins".to_string()),
                required: false,
                options: None,
                placeholder: None,
            },
            NodeProperty {
                name: "fallbackOutput".to_string(),
                display_name: "Fallback Output".to_string(),
                property_type: NodePropertyType::Number,
                default: None,
                description: Some("Output index used when nothing matches, -1 to drop".to_string()),
                required: false,
                options: None,
                placeholder: None,
            },
            NodeProperty {
                name: "outputExpression".to_string(),
                display_name: "Output Index".to_string(),
                property_type: NodePropertyType::String,
                default: None,
                description: Some("Expression returning the output index, used in expression mode".to_string()),
                required: false,
                options: None,
                placeholder: Some("={{ $json.priority }}".to_string()),
            },
            NodeProperty {
                name: "numberOutputs".to_string(),
                display_name: "Number Of Outputs".to_string(),
                property_type: NodePropertyType::Number,
                default: Some(n8n_workflow::NodeParameterValue::Number(4.0)),
                description: Some("Output count used in expression mode".to_string()),
                required: false,
                options: None,
                placeholder: None,
            },
        ],
        credentials: None,
        trigger: false,
        polling: false,
    }
}

fn merge_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.merge".to_string(),
        display_name: "Merge".to_string(),
        group: vec!["flow".to_string()],
        description: "Merge multiple inputs into one".to_string(),
        version: NodeVersion::Single(1),
        icon: Some("fa:code-merge".to_string()),
        input_count: InputCount::Infinite,
        inputs: vec![main_input(), main_input()],
        outputs: vec![main_output()],
        default_input_name: None,
        default_output_name: None,
        properties: vec![NodeProperty {
            name: "mode".to_string(),
            display_name: "Mode".to_string(),
            property_type: NodePropertyType::Options,
            default: None,
            description: Some(
                "How to merge the inputs: append, waitForAll, keepMatches, combinePairs"
                    .to_string(),
            ),
            required: false,
            options: None,
            placeholder: None,
        }],
        credentials: None,
        trigger: false,
        polling: false,
    }
}

fn code_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.code".to_string(),
        display_name: "Code".to_string(),
        group: vec!["transform".to_string()],
        description: "Execute custom JavaScript against the input items".to_string(),
        version: NodeVersion::Single(1),
        icon: Some("fa:code".to_string()),
        input_count: InputCount::Fixed(1),
        inputs: vec![main_input()],
        outputs: vec![main_output()],
        default_input_name: None,
        default_output_name: None,
        properties: vec![
            NodeProperty {
                name: "mode".to_string(),
                display_name: "Mode".to_string(),
                property_type: NodePropertyType::Options,
                default: None,
                description: Some("runOnceForAllItems or runOnceForEachItem".to_string()),
                required: false,
                options: None,
                placeholder: None,
            },
            NodeProperty {
                name: "code".to_string(),
                display_name: "Code".to_string(),
                property_type: NodePropertyType::String,
                default: None,
                description: Some("JavaScript to execute".to_string()),
                required: true,
                options: None,
                placeholder: None,
            },
        ],
        credentials: None,
        trigger: false,
        polling: false,
    }
}

fn http_request_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.httpRequest".to_string(),
        display_name: "HTTP Request".to_string(),
        group: vec!["output".to_string()],
        description: "Make HTTP requests".to_string(),
        version: NodeVersion::Single(1),
        icon: Some("fa:globe".to_string()),
        input_count: InputCount::Fixed(1),
        inputs: vec![main_input()],
        outputs: vec![main_output()],
        default_input_name: None,
        default_output_name: None,
        properties: vec![
            NodeProperty {
                name: "url".to_string(),
                display_name: "URL".to_string(),
                property_type: NodePropertyType::String,
                default: None,
                description: Some("URL to request".to_string()),
                required: true,
                options: None,
                placeholder: Some("https://example.com".to_string()),
            },
            NodeProperty {
                name: "method".to_string(),
                display_name: "Method".to_string(),
                property_type: NodePropertyType::Options,
                default: None,
                description: Some("HTTP method".to_string()),
                required: false,
                options: None,
                placeholder: None,
            },
            NodeProperty {
                name: "headers".to_string(),
                display_name: "Headers".to_string(),
                property_type: NodePropertyType::Collection,
                default: None,
                description: Some("Request headers".to_string()),
                required: false,
                options: None,
                placeholder: None,
            },
            NodeProperty {
                name: "body".to_string(),
                display_name: "Body".to_string(),
                property_type: NodePropertyType::Json,
                default: None,
                description: Some("Request body".to_string()),
                required: false,
                options: None,
                placeholder: None,
            },
            NodeProperty {
                name: "responseType".to_string(),
                display_name: "Response Format".to_string(),
                property_type: NodePropertyType::Options,
                default: None,
                description: Some("json, text, or binary".to_string()),
                required: false,
                options: None,
                placeholder: None,
            },
        ],
        credentials: Some(vec![NodeCredentialDescription {
            name: "httpBasicAuth".to_string(),
            required: false,
            display_options: None,
        }]),
        trigger: false,
        polling: false,
    }
}

fn no_op_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.noOp".to_string(),
        display_name: "No Operation".to_string(),
        group: vec!["flow".to_string()],
        description: "Pass through without modification".to_string(),
        version: NodeVersion::Single(1),
        icon: Some("fa:arrow-right".to_string()),
        input_count: InputCount::Fixed(1),
        inputs: vec![main_input()],
        outputs: vec![main_output()],
        default_input_name: None,
        default_output_name: None,
        properties: vec![],
        credentials: None,
        trigger: false,
        polling: false,
    }
}

fn filter_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.filter".to_string(),
        display_name: "Filter".to_string(),
        group: vec!["transform".to_string()],
        description: "Keep only items matching a condition".to_string(),
        version: NodeVersion::Single(1),
        icon: Some("fa:filter".to_string()),
        input_count: InputCount::Fixed(1),
        inputs: vec![main_input()],
        outputs: vec![main_output()],
        default_input_name: None,
        default_output_name: None,
        properties: vec![NodeProperty {
            name: "conditions".to_string(),
            display_name: "Conditions".to_string(),
            property_type: NodePropertyType::Filter,
            default: None,
            description: Some("Items that don't match are dropped".to_string()),
            required: true,
            options: None,
            placeholder: None,
        }],
        credentials: None,
        trigger: false,
        polling: false,
    }
}

fn sort_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.sort".to_string(),
        display_name: "Sort".to_string(),
        group: vec!["transform".to_string()],
        description: "Sort items by one or more fields".to_string(),
        version: NodeVersion::Single(1),
        icon: Some("fa:sort".to_string()),
        input_count: InputCount::Fixed(1),
        inputs: vec![main_input()],
        outputs: vec![main_output()],
        default_input_name: None,
        default_output_name: None,
        properties: vec![NodeProperty {
            name: "sortFields".to_string(),
            display_name: "Fields To Sort By".to_string(),
            property_type: NodePropertyType::FixedCollection,
            default: None,
            description: None,
            required: false,
            options: None,
            placeholder: None,
        }],
        credentials: None,
        trigger: false,
        polling: false,
    }
}

fn limit_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.limit".to_string(),
        display_name: "Limit".to_string(),
        group: vec!["transform".to_string()],
        description: "Restrict the number of items".to_string(),
        version: NodeVersion::Single(1),
        icon: Some("fa:compress".to_string()),
        input_count: InputCount::Fixed(1),
        inputs: vec![main_input()],
        outputs: vec![main_output()],
        default_input_name: None,
        default_output_name: None,
        properties: vec![NodeProperty {
            name: "maxItems".to_string(),
            display_name: "Max Items".to_string(),
            property_type: NodePropertyType::Number,
            default: Some(n8n_workflow::NodeParameterValue::Number(1.0)),
            description: None,
            required: true,
            options: None,
            placeholder: None,
        }],
        credentials: None,
        trigger: false,
        polling: false,
    }
}

fn remove_duplicates_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.removeDuplicates".to_string(),
        display_name: "Remove Duplicates".to_string(),
        group: vec!["transform".to_string()],
        description: "Remove items that duplicate a previous item".to_string(),
        version: NodeVersion::Single(1),
        icon: Some("fa:clone".to_string()),
        input_count: InputCount::Fixed(1),
        inputs: vec![main_input()],
        outputs: vec![main_output()],
        default_input_name: None,
        default_output_name: None,
        properties: vec![NodeProperty {
            name: "compare".to_string(),
            display_name: "Compare".to_string(),
            property_type: NodePropertyType::Options,
            default: None,
            description: Some("allFields or a list of field names".to_string()),
            required: false,
            options: None,
            placeholder: None,
        }],
        credentials: None,
        trigger: false,
        polling: false,
    }
}

fn aggregate_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.aggregate".to_string(),
        display_name: "Aggregate".to_string(),
        group: vec!["transform".to_string()],
        description: "Combine items into a single item with a list field".to_string(),
        version: NodeVersion::Single(1),
        icon: Some("fa:layer-group".to_string()),
        input_count: InputCount::Fixed(1),
        inputs: vec![main_input()],
        outputs: vec![main_output()],
        default_input_name: None,
        default_output_name: None,
        properties: vec![NodeProperty {
            name: "destinationFieldName".to_string(),
            display_name: "Put Output In Field".to_string(),
            property_type: NodePropertyType::String,
            default: None,
            description: None,
            required: false,
            options: None,
            placeholder: Some("data".to_string()),
        }],
        credentials: None,
        trigger: false,
        polling: false,
    }
}

fn split_in_batches_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.splitInBatches".to_string(),
        display_name: "Split In Batches".to_string(),
        group: vec!["flow".to_string()],
        description: "Split items into batches and loop over them".to_string(),
        version: NodeVersion::Single(1),
        icon: Some("fa:th-large".to_string()),
        input_count: InputCount::Fixed(1),
        inputs: vec![main_input()],
        outputs: vec![
            NodeConnectionConfig {
                connection_type: "main".to_string(),
                display_name: Some("Done".to_string()),
                required: false,
                max_connections: None,
            },
            NodeConnectionConfig {
                connection_type: "main".to_string(),
                display_name: Some("Loop".to_string()),
                required: false,
                max_connections: None,
            },
        ],
        default_input_name: None,
        default_output_name: None,
        properties: vec![NodeProperty {
            name: "batchSize".to_string(),
            display_name: "Batch Size".to_string(),
            property_type: NodePropertyType::Number,
            default: Some(n8n_workflow::NodeParameterValue::Number(1.0)),
            description: None,
            required: true,
            options: None,
            placeholder: None,
        }],
        credentials: None,
        trigger: false,
        polling: false,
    }
}

fn wait_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.wait".to_string(),
        display_name: "Wait".to_string(),
        group: vec!["flow".to_string()],
        description: "Pause execution for a fixed duration".to_string(),
        version: NodeVersion::Single(1),
        icon: Some("fa:pause".to_string()),
        input_count: InputCount::Fixed(1),
        inputs: vec![main_input()],
        outputs: vec![main_output()],
        default_input_name: None,
        default_output_name: None,
        properties: vec![
            NodeProperty {
                name: "amount".to_string(),
                display_name: "Amount".to_string(),
                property_type: NodePropertyType::Number,
                default: Some(n8n_workflow::NodeParameterValue::Number(1.0)),
                description: None,
                required: false,
                options: None,
                placeholder: None,
            },
            NodeProperty {
                name: "unit".to_string(),
                display_name: "Unit".to_string(),
                property_type: NodePropertyType::Options,
                default: None,
                description: Some("seconds, minutes, hours, or milliseconds".to_string()),
                required: false,
                options: None,
                placeholder: None,
            },
        ],
        credentials: None,
        trigger: false,
        polling: false,
    }
}

fn stop_and_error_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.stopAndError".to_string(),
        display_name: "Stop And Error".to_string(),
        group: vec!["flow".to_string()],
        description: "Throw an error, stopping the workflow".to_string(),
        version: NodeVersion::Single(1),
        icon: Some("fa:exclamation-circle".to_string()),
        input_count: InputCount::Fixed(1),
        inputs: vec![main_input()],
        outputs: vec![main_output()],
        default_input_name: None,
        default_output_name: None,
        properties: vec![NodeProperty {
            name: "message".to_string(),
            display_name: "Error Message".to_string(),
            property_type: NodePropertyType::String,
            default: None,
            description: None,
            required: true,
            options: None,
            placeholder: None,
        }],
        credentials: None,
        trigger: false,
        polling: false,
    }
}

fn execute_workflow_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.executeWorkflow".to_string(),
        display_name: "Execute Workflow".to_string(),
        group: vec!["transform".to_string()],
        description: "Run another workflow as a sub-workflow".to_string(),
        version: NodeVersion::Single(1),
        icon: Some("fa:sitemap".to_string()),
        input_count: InputCount::Fixed(1),
        inputs: vec![main_input()],
        outputs: vec![main_output()],
        default_input_name: None,
        default_output_name: None,
        properties: vec![NodeProperty {
            name: "workflowId".to_string(),
            display_name: "Workflow".to_string(),
            property_type: NodePropertyType::String,
            default: None,
            description: None,
            required: true,
            options: None,
            placeholder: None,
        }],
        credentials: None,
        trigger: false,
        polling: false,
    }
}

fn llm_chat_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.llmChat".to_string(),
        display_name: "LLM Chat".to_string(),
        group: vec!["transform".to_string(), "ai".to_string()],
        description: "Send a chat completion request to a language model endpoint".to_string(),
        version: NodeVersion::Single(1),
        icon: Some("fa:comment-dots".to_string()),
        input_count: InputCount::Fixed(1),
        inputs: vec![main_input()],
        outputs: vec![main_output()],
        default_input_name: None,
        default_output_name: None,
        properties: vec![
            NodeProperty {
                name: "endpoint".to_string(),
                display_name: "Endpoint URL".to_string(),
                property_type: NodePropertyType::String,
                default: None,
                description: Some("Chat completion HTTP endpoint".to_string()),
                required: true,
                options: None,
                placeholder: None,
            },
            NodeProperty {
                name: "prompt".to_string(),
                display_name: "Prompt".to_string(),
                property_type: NodePropertyType::String,
                default: None,
                description: None,
                required: true,
                options: None,
                placeholder: None,
            },
            NodeProperty {
                name: "model".to_string(),
                display_name: "Model".to_string(),
                property_type: NodePropertyType::String,
                default: None,
                description: None,
                required: false,
                options: None,
                placeholder: None,
            },
        ],
        credentials: Some(vec![NodeCredentialDescription {
            name: "llmApi".to_string(),
            required: false,
            display_options: None,
        }]),
        trigger: false,
        polling: false,
    }
}

fn ai_agent_description() -> NodeTypeDescription {
    NodeTypeDescription {
        name: "n8n-nodes-base.aiAgent".to_string(),
        display_name: "AI Agent".to_string(),
        group: vec!["transform".to_string(), "ai".to_string()],
        description: "Run an agent loop against a language model endpoint".to_string(),
        version: NodeVersion::Single(1),
        icon: Some("fa:robot".to_string()),
        input_count: InputCount::Fixed(1),
        inputs: vec![main_input()],
        outputs: vec![main_output()],
        default_input_name: None,
        default_output_name: None,
        properties: vec![
            NodeProperty {
                name: "endpoint".to_string(),
                display_name: "Endpoint URL".to_string(),
                property_type: NodePropertyType::String,
                default: None,
                description: Some("Agent HTTP endpoint".to_string()),
                required: true,
                options: None,
                placeholder: None,
            },
            NodeProperty {
                name: "instructions".to_string(),
                display_name: "Instructions".to_string(),
                property_type: NodePropertyType::String,
                default: None,
                description: None,
                required: true,
                options: None,
                placeholder: None,
            },
        ],
        credentials: Some(vec![NodeCredentialDescription {
            name: "llmApi".to_string(),
            required: false,
            display_options: None,
        }]),
        trigger: false,
        polling: false,
    }
}
