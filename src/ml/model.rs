use std::fmt;

use burn::{
    nn::{
        loss::CrossEntropyLossConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::softmax,
};

use crate::data::batcher::ClassificationBatch;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct SimpleClassifierConfig {
    pub vocab_size:    usize,
    pub num_labels:    usize,
    pub embedding_dim: usize,
    /// Average instead of sum in the bag-of-embeddings encoder
    #[config(default = false)]
    pub averaged:      bool,
}

impl SimpleClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SimpleClassifier<B> {
        let embedder = TextFieldEmbedder {
            token_embedder: EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device),
        };
        let encoder = BagOfEmbeddingsEncoder {
            embedding_dim: self.embedding_dim,
            averaged:      self.averaged,
        };
        let classifier = LinearConfig::new(encoder.output_dim(), self.num_labels).init(device);
        SimpleClassifier { embedder, encoder, classifier }
    }
}

// ─── Embedder ─────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct TextFieldEmbedder<B: Backend> {
    pub token_embedder: Embedding<B>,
}

impl<B: Backend> TextFieldEmbedder<B> {
    /// tokens: [batch, seq_len] → [batch, seq_len, embedding_dim]
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        self.token_embedder.forward(tokens)
    }
}

// ─── Encoder ──────────────────────────────────────────────────────────────────
/// Collapses the token axis: masked sum of embeddings, or the
/// masked mean when `averaged` is set. Has no parameters.
#[derive(Module, Clone, Debug)]
pub struct BagOfEmbeddingsEncoder {
    pub embedding_dim: usize,
    pub averaged:      bool,
}

impl BagOfEmbeddingsEncoder {
    /// embedded: [batch, seq_len, dim], mask: [batch, seq_len] → [batch, dim]
    pub fn forward<B: Backend>(&self, embedded: Tensor<B, 3>, mask: Tensor<B, 2, Bool>) -> Tensor<B, 2> {
        let [batch_size, _, dim] = embedded.dims();
        let mask = mask.float().unsqueeze_dim::<3>(2); // [batch, seq_len, 1]

        let summed = (embedded * mask.clone())
            .sum_dim(1)
            .reshape([batch_size, dim]);

        if !self.averaged {
            return summed;
        }
        // Rows of pure padding divide by 1 and stay zero
        let lengths = mask.sum_dim(1).reshape([batch_size, 1]).clamp_min(1.0);
        summed / lengths
    }

    pub fn output_dim(&self) -> usize {
        self.embedding_dim
    }
}

// ─── Classifier ───────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct SimpleClassifier<B: Backend> {
    pub embedder:   TextFieldEmbedder<B>,
    pub encoder:    BagOfEmbeddingsEncoder,
    pub classifier: Linear<B>,
}

pub struct ClassifierOutput<B: Backend> {
    /// [batch, num_labels]
    pub logits: Tensor<B, 2>,
    /// softmax over logits, [batch, num_labels]
    pub probs:  Tensor<B, 2>,
    /// Mean cross-entropy, [1]; only when labels were given
    pub loss:   Option<Tensor<B, 1>>,
}

impl<B: Backend> SimpleClassifier<B> {
    pub fn forward(
        &self,
        tokens: Tensor<B, 2, Int>,
        mask:   Tensor<B, 2, Bool>,
        labels: Option<Tensor<B, 1, Int>>,
    ) -> ClassifierOutput<B> {
        let embedded = self.embedder.forward(tokens);      // [batch, seq_len, dim]
        let encoded  = self.encoder.forward(embedded, mask); // [batch, dim]
        let logits   = self.classifier.forward(encoded);    // [batch, num_labels]
        let probs    = softmax(logits.clone(), 1);

        let loss = labels.map(|labels| {
            CrossEntropyLossConfig::new()
                .init(&logits.device())
                .forward(logits.clone(), labels)
        });

        ClassifierOutput { logits, probs, loss }
    }

    pub fn forward_batch(&self, batch: &ClassificationBatch<B>) -> ClassifierOutput<B> {
        self.forward(batch.tokens.clone(), batch.mask.clone(), batch.labels.clone())
    }

    pub fn num_labels(&self) -> usize {
        self.classifier.weight.dims()[1]
    }
}

impl<B: Backend> fmt::Display for ClassifierOutput<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.loss {
            Some(loss) => write!(f, "{{loss: {}, probs: {}}}", loss, self.probs),
            None => write!(f, "{{probs: {}}}", self.probs),
        }
    }
}
