//! 워크로드 분류 — 파생 엔진의 유일한 비결정 지점.
//!
//! 응답 시간 분해 단계는 애플리케이션 유형과 쿼리 복잡도를 확률적으로
//! 선택한다. 그 선택을 trait 뒤로 분리해서 프로덕션은 PRNG, 테스트는
//! 고정 분류기를 주입한다. 실제 애플리케이션 텔레메트리가 생기면
//! 이 trait의 구현만 교체하면 된다.

use rand::RngExt;

/// 애플리케이션 유형 (저장 코드 1–4)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppClass {
    /// 웹 애플리케이션
    Web,
    /// API 서비스
    Api,
    /// 데이터베이스 애플리케이션
    Database,
    /// 파일 서비스
    File,
}

impl AppClass {
    /// 저장 필드용 코드
    pub fn code(&self) -> i64 {
        match self {
            AppClass::Web => 1,
            AppClass::Api => 2,
            AppClass::Database => 3,
            AppClass::File => 4,
        }
    }
}

/// 데이터베이스 쿼리 복잡도 (저장 코드 1–4)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryClass {
    /// 단순 SELECT
    Simple,
    /// 복잡한 WHERE/ORDER BY
    Complex,
    /// JOIN
    Join,
    /// GROUP BY/COUNT/SUM 집계
    Aggregate,
}

impl QueryClass {
    /// 저장 필드용 코드
    pub fn code(&self) -> i64 {
        match self {
            QueryClass::Simple => 1,
            QueryClass::Complex => 2,
            QueryClass::Join => 3,
            QueryClass::Aggregate => 4,
        }
    }
}

/// 응답 시간 분해의 확률적 선택을 공급하는 소스
pub trait WorkloadClassifier: Send + Sync {
    /// DNS 캐시 히트 여부 (프로덕션 기대 확률 70%)
    fn dns_cache_hit(&self) -> bool;

    /// 애플리케이션 유형과 응답 시간 배율
    fn app_workload(&self) -> (AppClass, f64);

    /// 쿼리 복잡도와 쿼리 시간 배율
    fn query_workload(&self) -> (QueryClass, f64);

    /// 커넥션 풀 대기 시간 (ms) — `slow_query`면 풀 경합 구간
    fn connection_wait_ms(&self, slow_query: bool) -> f64;
}

/// 프로덕션 분류기 — 스레드 로컬 PRNG 기반
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomClassifier;

impl WorkloadClassifier for RandomClassifier {
    fn dns_cache_hit(&self) -> bool {
        rand::rng().random_bool(0.7)
    }

    fn app_workload(&self) -> (AppClass, f64) {
        let mut rng = rand::rng();
        match rng.random_range(0..4) {
            0 => (AppClass::Web, rng.random_range(0.8..1.5)),
            1 => (AppClass::Api, rng.random_range(0.5..1.2)),
            2 => (AppClass::Database, rng.random_range(1.2..2.5)),
            _ => (AppClass::File, rng.random_range(0.3..1.0)),
        }
    }

    fn query_workload(&self) -> (QueryClass, f64) {
        let mut rng = rand::rng();
        match rng.random_range(0..4) {
            0 => (QueryClass::Simple, rng.random_range(0.5..1.0)),
            1 => (QueryClass::Complex, rng.random_range(1.5..3.0)),
            2 => (QueryClass::Join, rng.random_range(2.0..4.0)),
            _ => (QueryClass::Aggregate, rng.random_range(1.8..3.5)),
        }
    }

    fn connection_wait_ms(&self, slow_query: bool) -> f64 {
        let mut rng = rand::rng();
        if slow_query {
            rng.random_range(5.0..20.0)
        } else {
            rng.random_range(0.5..5.0)
        }
    }
}

/// 결정적 분류기 — 테스트에서 파생 결과를 재현 가능하게 만든다
#[derive(Debug, Clone, Copy)]
pub struct FixedClassifier {
    /// DNS 캐시 히트 여부
    pub cache_hit: bool,
    /// 고정 애플리케이션 유형
    pub app: AppClass,
    /// 고정 애플리케이션 배율
    pub app_multiplier: f64,
    /// 고정 쿼리 복잡도
    pub query: QueryClass,
    /// 고정 쿼리 배율
    pub query_multiplier: f64,
    /// 고정 커넥션 대기 (ms)
    pub wait_ms: f64,
}

impl Default for FixedClassifier {
    fn default() -> Self {
        Self {
            cache_hit: false,
            app: AppClass::Web,
            app_multiplier: 1.0,
            query: QueryClass::Simple,
            query_multiplier: 1.0,
            wait_ms: 1.0,
        }
    }
}

impl WorkloadClassifier for FixedClassifier {
    fn dns_cache_hit(&self) -> bool {
        self.cache_hit
    }

    fn app_workload(&self) -> (AppClass, f64) {
        (self.app, self.app_multiplier)
    }

    fn query_workload(&self) -> (QueryClass, f64) {
        (self.query, self.query_multiplier)
    }

    fn connection_wait_ms(&self, _slow_query: bool) -> f64 {
        self.wait_ms
    }
}
