/// 遗忘曲线衰减指数
pub const DECAY: f64 = -0.5;

/// 遗忘曲线缩放因子，满足 R(S) = 0.9：0.9^(1/DECAY) - 1 = 19/81
pub const FACTOR: f64 = 19.0 / 81.0;

/// 模型权重个数
pub const WEIGHT_COUNT: usize = 19;

/// 默认模型权重（w0-w18）
pub const DEFAULT_WEIGHTS: [f64; WEIGHT_COUNT] = [
    0.4072, 1.1829, 3.1262, 15.4722, // w0-w3: initial stability
    7.2102, 0.5316, // w4-w5: initial difficulty
    1.0651, 0.0234, // w6-w7: difficulty delta, mean reversion
    1.616, 0.1544, 1.0824, // w8-w10: recall stability
    1.9813, 0.0953, 0.2975, 2.2042, // w11-w14: forget stability
    0.2407, 2.9466, // w15-w16: hard penalty, easy bonus
    0.5034, 0.6567, // w17-w18: short-term stability
];

/// 默认目标保持率
pub const DEFAULT_REQUEST_RETENTION: f64 = 0.9;

/// 默认最大复习间隔（天）
pub const DEFAULT_MAXIMUM_INTERVAL: u32 = 36500;

pub const MIN_DIFFICULTY: f64 = 1.0;
pub const MAX_DIFFICULTY: f64 = 10.0;
pub const MIN_STABILITY: f64 = 0.1;

/// 新卡片短期复习偏移（分钟）：Again / Hard / Good
pub const NEW_AGAIN_MINUTES: f64 = 1.0;
pub const NEW_HARD_MINUTES: f64 = 5.0;
pub const NEW_GOOD_MINUTES: f64 = 10.0;

/// 学习/复习阶段 Again 的重学偏移（分钟）
pub const RELEARN_AGAIN_MINUTES: f64 = 5.0;

/// 学习/复习阶段 Hard 间隔为 0 时的短期偏移（分钟）
pub const SHORT_TERM_HARD_MINUTES: f64 = 10.0;

/// 非焦点词（句中顺带出现的词）的默认部分权重
pub const DEFAULT_INCIDENTAL_WEIGHT: f64 = 0.15;

/// 允许词表按此粒度向下取整
pub const ALLOWED_WORDS_CHUNK: usize = 25;

pub const SECONDS_PER_DAY: f64 = 86_400.0;
pub const SECONDS_PER_MINUTE: f64 = 60.0;
